//! The `Ledger` aggregate: customers, accounts, pending transfers and persistence.
use tracing::{debug, info, warn};

use crate::bank::{
    Account, AccountNumber, BalanceIndex, Customer, CustomerId, FifoQueue, KeyedStore,
    LedgerConfig, LedgerError, Money, PendingTransfer, PriorityHeap, Session, Snapshot,
    SnapshotError, Ticket, TransactionRecord, TransferOutcome, account_number,
    auth::validate_password, customer_id,
};

/// Owns every customer and account plus the structures that order pending transfers.
///
/// Accounts are stored once, in the global account store; customers refer to them by
/// account number. All operations run to completion before returning, including the
/// snapshot write.
pub struct Ledger {
    config: LedgerConfig,
    customers: KeyedStore<Customer>,
    accounts: KeyedStore<Account>,
    transfer_queue: FifoQueue<PendingTransfer>,
    priority_heap: PriorityHeap<PendingTransfer>,
    balance_index: BalanceIndex,
    /// Set when a balance changed after the index was last built.
    index_stale: bool,
    next_ticket: Ticket,
}

impl Ledger {
    /// Creates an empty ledger. Nothing is read from disk.
    pub fn new(config: LedgerConfig) -> Self {
        Ledger {
            customers: KeyedStore::new(config.bucket_count),
            accounts: KeyedStore::new(config.bucket_count),
            transfer_queue: FifoQueue::new(),
            priority_heap: PriorityHeap::new(),
            balance_index: BalanceIndex::new(),
            index_stale: false,
            next_ticket: 1,
            config,
        }
    }

    /// Creates a ledger, loading the configured snapshot if it exists.
    pub fn open(config: LedgerConfig) -> Result<Self, LedgerError> {
        let snapshot = match &config.snapshot_path {
            Some(path) => Snapshot::load(path)?,
            None => None,
        };
        match snapshot {
            Some(snapshot) => Ok(Self::from_snapshot(config, snapshot)?),
            None => Ok(Self::new(config)),
        }
    }

    /// Rebuilds a ledger from a snapshot after validating it.
    ///
    /// Accounts enter the balance index at their persisted balance.
    pub fn from_snapshot(config: LedgerConfig, snapshot: Snapshot) -> Result<Self, SnapshotError> {
        snapshot.validate()?;
        let mut ledger = Self::new(config);

        for record in snapshot.customers {
            let customer =
                Customer::with_hash(record.customer_id.clone(), record.name, record.password_hash);
            ledger.customers.put(record.customer_id, customer);
        }

        for record in snapshot.accounts {
            let account = Account::restore(
                record.account_number.clone(),
                record.customer_id.clone(),
                record.balance,
                record.transaction_history,
            );
            if let Some(customer) = ledger.customers.get_mut(&record.customer_id) {
                customer.add_account(record.account_number.clone());
            }
            ledger
                .balance_index
                .insert(record.account_number.clone(), record.balance);
            ledger.accounts.put(record.account_number, account);
        }

        info!(
            customers = ledger.customers.len(),
            accounts = ledger.accounts.len(),
            "Ledger restored from snapshot"
        );
        Ok(ledger)
    }

    /// The configuration this ledger was opened with.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Writes the full state to the snapshot file, if one is configured.
    fn persist(&self) -> Result<(), LedgerError> {
        if let Some(path) = &self.config.snapshot_path {
            Snapshot::capture(self.customers.values(), self.accounts.values()).save(path)?;
        }
        Ok(())
    }

    /// Registers a customer and returns the assigned identifier.
    pub fn register(&mut self, name: &str, password: &str) -> Result<CustomerId, LedgerError> {
        validate_password(password)?;

        let id = next_free_id(&self.customers, customer_id);
        self.customers
            .put(id.clone(), Customer::new(id.clone(), name.trim(), password));
        self.persist()?;

        info!(customer_id = %id, "Customer registered");
        Ok(id)
    }

    /// Logs `session` in as `customer_id` if the password matches.
    pub fn authenticate(
        &self,
        session: &mut Session,
        customer_id: &str,
        password: &str,
    ) -> Result<(), LedgerError> {
        match self.customers.get(customer_id) {
            Some(customer) if customer.verify_password(password) => {
                session.login(customer.customer_id().clone());
                info!(customer_id, "Customer authenticated");
                Ok(())
            }
            _ => {
                warn!(customer_id, "Authentication failed");
                Err(LedgerError::AuthFailed)
            }
        }
    }

    /// The customer logged in on `session`.
    pub fn customer(&self, session: &Session) -> Result<&Customer, LedgerError> {
        let id = session.require()?;
        self.customers.get(id).ok_or(LedgerError::NoSession)
    }

    /// Opens a zero-balance account for the session's customer.
    pub fn create_account(&mut self, session: &Session) -> Result<AccountNumber, LedgerError> {
        let owner = self.customer(session)?.customer_id().clone();

        let number = next_free_id(&self.accounts, account_number);
        let account = Account::new(number.clone(), owner.clone());
        self.balance_index.insert(number.clone(), account.balance());
        self.accounts.put(number.clone(), account);
        if let Some(customer) = self.customers.get_mut(&owner) {
            customer.add_account(number.clone());
        }
        self.persist()?;

        info!(customer_id = %owner, account = %number, "Account created");
        Ok(number)
    }

    /// Looks up an account the session's customer owns.
    fn owned_account(&self, session: &Session, number: &str) -> Result<&Account, LedgerError> {
        let owner = self.customer(session)?.customer_id();
        let account = self
            .accounts
            .get(number)
            .ok_or_else(|| LedgerError::NotFound(number.to_string()))?;
        if account.customer_id() != owner {
            return Err(LedgerError::Forbidden(number.to_string()));
        }
        Ok(account)
    }

    fn owned_account_mut(
        &mut self,
        session: &Session,
        number: &str,
    ) -> Result<&mut Account, LedgerError> {
        self.owned_account(session, number)?;
        self.accounts
            .get_mut(number)
            .ok_or_else(|| LedgerError::NotFound(number.to_string()))
    }

    /// Deposits into an owned account. Returns the new balance.
    pub fn deposit(
        &mut self,
        session: &Session,
        number: &str,
        amount: Money,
    ) -> Result<Money, LedgerError> {
        let balance = self.owned_account_mut(session, number)?.deposit(amount)?;
        self.index_stale = true;
        self.persist()?;

        info!(account = number, amount, balance, "Deposit applied");
        Ok(balance)
    }

    /// Withdraws from an owned account. Returns the new balance.
    pub fn withdraw(
        &mut self,
        session: &Session,
        number: &str,
        amount: Money,
    ) -> Result<Money, LedgerError> {
        let balance = self.owned_account_mut(session, number)?.withdraw(amount)?;
        self.index_stale = true;
        self.persist()?;

        info!(account = number, amount, balance, "Withdrawal applied");
        Ok(balance)
    }

    /// Current balance of an owned account.
    pub fn balance(&self, session: &Session, number: &str) -> Result<Money, LedgerError> {
        Ok(self.owned_account(session, number)?.balance())
    }

    /// Accounts of the session's customer, in creation order.
    pub fn accounts_of(&self, session: &Session) -> Result<Vec<&Account>, LedgerError> {
        let customer = self.customer(session)?;
        Ok(customer
            .accounts()
            .iter()
            .filter_map(|number| self.accounts.get(number))
            .collect())
    }

    /// History of an owned account, oldest first.
    pub fn get_history(
        &self,
        session: &Session,
        number: &str,
    ) -> Result<Vec<&TransactionRecord>, LedgerError> {
        Ok(self.owned_account(session, number)?.history().collect())
    }

    /// Queues a transfer from an owned account without applying it.
    ///
    /// Transfers above the configured threshold go to the priority heap, the rest to
    /// the FIFO queue. The destination is only checked when the transfer is applied.
    pub fn submit_transfer(
        &mut self,
        session: &Session,
        from: &str,
        to: &str,
        amount: Money,
    ) -> Result<Ticket, LedgerError> {
        self.owned_account(session, from)?;
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }
        if from == to {
            return Err(LedgerError::SameAccount);
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let pending = PendingTransfer {
            ticket,
            from: from.to_string(),
            to: to.to_string(),
            amount,
            priority: amount > self.config.priority_threshold,
        };
        debug!(ticket, priority = pending.priority, "Transfer queued");
        if pending.priority {
            self.priority_heap.insert(pending);
        } else {
            self.transfer_queue.enqueue(pending);
        }
        Ok(ticket)
    }

    /// Submits a transfer and drains all pending work.
    ///
    /// Returns the rejection of this transfer, if it was rejected when applied.
    /// Outcomes of other transfers drained along the way are logged.
    pub fn transfer(
        &mut self,
        session: &Session,
        from: &str,
        to: &str,
        amount: Money,
    ) -> Result<(), LedgerError> {
        let ticket = self.submit_transfer(session, from, to, amount)?;
        let outcomes = self.drain_pending()?;
        outcomes
            .into_iter()
            .find(|outcome| outcome.transfer.ticket == ticket)
            .map_or(Ok(()), |outcome| outcome.result)
    }

    /// Applies every pending transfer: the priority heap first, largest amount first,
    /// then the FIFO queue in arrival order.
    ///
    /// Returns one outcome per transfer. A snapshot failure aborts the drain and leaves
    /// the remaining transfers pending.
    pub fn drain_pending(&mut self) -> Result<Vec<TransferOutcome>, LedgerError> {
        let mut outcomes = Vec::new();
        while let Some(pending) = self.priority_heap.extract_max() {
            outcomes.push(self.apply_pending(pending)?);
        }
        while let Some(pending) = self.transfer_queue.dequeue() {
            outcomes.push(self.apply_pending(pending)?);
        }
        Ok(outcomes)
    }

    fn apply_pending(&mut self, transfer: PendingTransfer) -> Result<TransferOutcome, LedgerError> {
        let result = self.apply_transfer(&transfer);
        match &result {
            Ok(()) => {
                self.index_stale = true;
                self.persist()?;
                info!(
                    ticket = transfer.ticket,
                    from = %transfer.from,
                    to = %transfer.to,
                    amount = transfer.amount,
                    "Transfer applied"
                );
            }
            Err(err) => warn!(ticket = transfer.ticket, error = %err, "Transfer rejected"),
        }
        Ok(TransferOutcome { transfer, result })
    }

    /// Moves the money of one transfer. Either both halves are applied or nothing is.
    fn apply_transfer(&mut self, transfer: &PendingTransfer) -> Result<(), LedgerError> {
        let source = self
            .accounts
            .get(&transfer.from)
            .ok_or_else(|| LedgerError::NotFound(transfer.from.clone()))?;
        let destination = self
            .accounts
            .get(&transfer.to)
            .ok_or_else(|| LedgerError::NotFound(transfer.to.clone()))?;
        source.check_debit(transfer.amount)?;
        destination.check_credit(transfer.amount)?;

        if let Some(source) = self.accounts.get_mut(&transfer.from) {
            source.transfer_out(transfer.amount, &transfer.to)?;
        }
        if let Some(destination) = self.accounts.get_mut(&transfer.to) {
            destination.transfer_in(transfer.amount, &transfer.from)?;
        }
        Ok(())
    }

    /// Number of transfers waiting in the heap and the queue.
    pub fn pending_len(&self) -> usize {
        self.priority_heap.len() + self.transfer_queue.len()
    }

    /// Accounts whose indexed balance lies in `[low, high]`, in ascending balance order.
    ///
    /// With `refresh_balance_index` the index is rebuilt first if any balance changed, so
    /// results reflect current balances. Otherwise each account is found under the balance
    /// it had when it was indexed.
    pub fn search_by_balance(&mut self, low: Money, high: Money) -> Vec<&Account> {
        if self.config.refresh_balance_index && self.index_stale {
            self.rebuild_balance_index();
        }
        self.balance_index
            .search_range(low, high)
            .into_iter()
            .filter_map(|number| self.accounts.get(number))
            .collect()
    }

    /// Re-keys every account under its current balance.
    pub fn rebuild_balance_index(&mut self) {
        let mut accounts: Vec<&Account> = self.accounts.values().collect();
        accounts.sort_by(|a, b| a.account_number().cmp(b.account_number()));

        self.balance_index.clear();
        for account in accounts {
            self.balance_index
                .insert(account.account_number().clone(), account.balance());
        }
        self.index_stale = false;
        debug!(accounts = self.balance_index.len(), "Balance index rebuilt");
    }

    /// Looks up an account without any session check.
    pub fn account(&self, number: &str) -> Option<&Account> {
        self.accounts.get(number)
    }

    /// All accounts, ordered by account number.
    pub fn all_accounts(&self) -> Vec<&Account> {
        let mut accounts: Vec<&Account> = self.accounts.values().collect();
        accounts.sort_by(|a, b| a.account_number().cmp(b.account_number()));
        accounts
    }

    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }
}

/// First sequential identifier not yet present in `store`, starting at `len + 1`.
fn next_free_id<V>(store: &KeyedStore<V>, format: fn(usize) -> String) -> String {
    let mut n = store.len() + 1;
    loop {
        let id = format(n);
        if !store.contains_key(&id) {
            return id;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::bank::{TransactionKind, money_from_f64};

    fn money(value: f64) -> Money {
        money_from_f64(value).unwrap()
    }

    fn ledger() -> Ledger {
        Ledger::new(LedgerConfig::in_memory())
    }

    /// Registers a customer, logs in and opens `accounts` accounts.
    fn customer_with_accounts(
        ledger: &mut Ledger,
        name: &str,
        accounts: usize,
    ) -> (Session, Vec<AccountNumber>) {
        let id = ledger.register(name, "abcd1234").unwrap();
        let mut session = Session::anonymous();
        ledger.authenticate(&mut session, &id, "abcd1234").unwrap();
        let numbers = (0..accounts)
            .map(|_| ledger.create_account(&session).unwrap())
            .collect();
        (session, numbers)
    }

    #[test]
    fn test_end_to_end_flow() {
        let mut ledger = ledger();
        let id = ledger.register("Alice", "abcd1234").unwrap();
        assert_eq!(id, "CUST0001");

        let mut session = Session::anonymous();
        assert!(matches!(
            ledger.authenticate(&mut session, &id, "wrong1234"),
            Err(LedgerError::AuthFailed)
        ));
        assert!(!session.is_authenticated());
        ledger.authenticate(&mut session, &id, "abcd1234").unwrap();
        assert_eq!(ledger.customer(&session).unwrap().name(), "Alice");

        let first = ledger.create_account(&session).unwrap();
        assert_eq!(first, "ACC000001");
        assert_eq!(ledger.balance(&session, &first).unwrap(), 0);

        assert_eq!(ledger.deposit(&session, &first, money(500.0)).unwrap(), money(500.0));
        let history = ledger.get_history(&session, &first).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind(), TransactionKind::Deposit);

        assert!(matches!(
            ledger.withdraw(&session, &first, money(600.0)),
            Err(LedgerError::InsufficientFunds)
        ));
        assert_eq!(ledger.balance(&session, &first).unwrap(), money(500.0));

        let second = ledger.create_account(&session).unwrap();
        ledger.transfer(&session, &first, &second, money(500.0)).unwrap();
        assert_eq!(ledger.balance(&session, &first).unwrap(), 0);
        assert_eq!(ledger.balance(&session, &second).unwrap(), money(500.0));

        let out = ledger.get_history(&session, &first).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].kind(), TransactionKind::TransferOut);
        assert_eq!(out[1].amount(), -money(500.0));
        let incoming = ledger.get_history(&session, &second).unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].kind(), TransactionKind::TransferIn);
        assert_eq!(ledger.account(&second).unwrap().balance(), money(500.0));
        assert!(ledger.account("ACC999999").is_none());
    }

    #[test]
    fn test_register_rejects_weak_password() {
        let mut ledger = ledger();
        assert!(matches!(ledger.register("Bob", "short1"), Err(LedgerError::WeakCredential)));
        assert!(matches!(ledger.register("Bob", "onlyletters"), Err(LedgerError::WeakCredential)));
        assert_eq!(ledger.customer_count(), 0);
        assert_eq!(ledger.register("Bob", "letters123").unwrap(), "CUST0001");
        assert_eq!(ledger.register("Carol", "letters123").unwrap(), "CUST0002");
    }

    #[test]
    fn test_unknown_customer_fails_auth() {
        let ledger = ledger();
        let mut session = Session::anonymous();
        assert!(matches!(
            ledger.authenticate(&mut session, "CUST0042", "abcd1234"),
            Err(LedgerError::AuthFailed)
        ));
    }

    #[test]
    fn test_operations_require_session() {
        let mut ledger = ledger();
        let (_, accounts) = customer_with_accounts(&mut ledger, "Alice", 1);
        let anonymous = Session::anonymous();
        assert!(matches!(ledger.create_account(&anonymous), Err(LedgerError::NoSession)));
        assert!(matches!(
            ledger.deposit(&anonymous, &accounts[0], 10),
            Err(LedgerError::NoSession)
        ));
        assert!(matches!(
            ledger.get_history(&anonymous, &accounts[0]),
            Err(LedgerError::NoSession)
        ));
        assert!(matches!(ledger.accounts_of(&anonymous), Err(LedgerError::NoSession)));
    }

    #[test]
    fn test_logout_ends_session() {
        let mut ledger = ledger();
        let (mut session, _) = customer_with_accounts(&mut ledger, "Alice", 0);
        session.logout();
        assert!(matches!(ledger.create_account(&session), Err(LedgerError::NoSession)));
    }

    #[test]
    fn test_ownership_and_lookup_errors() {
        let mut ledger = ledger();
        let (alice, alice_accounts) = customer_with_accounts(&mut ledger, "Alice", 1);
        let (bob, _) = customer_with_accounts(&mut ledger, "Bob", 1);

        assert!(matches!(
            ledger.deposit(&bob, &alice_accounts[0], 10),
            Err(LedgerError::Forbidden(_))
        ));
        assert!(matches!(
            ledger.withdraw(&alice, "ACC999999", 10),
            Err(LedgerError::NotFound(_))
        ));
        assert!(matches!(
            ledger.deposit(&alice, &alice_accounts[0], 0),
            Err(LedgerError::InvalidAmount)
        ));
        assert!(matches!(
            ledger.transfer(&bob, &alice_accounts[0], "ACC000002", 10),
            Err(LedgerError::Forbidden(_))
        ));
        assert!(matches!(
            ledger.withdraw(&bob, &alice_accounts[0], 10),
            Err(LedgerError::Forbidden(_))
        ));
        assert!(matches!(
            ledger.get_history(&bob, &alice_accounts[0]),
            Err(LedgerError::Forbidden(_))
        ));
        assert!(matches!(
            ledger.balance(&bob, &alice_accounts[0]),
            Err(LedgerError::Forbidden(_))
        ));
    }

    #[test]
    fn test_accounts_of_lists_in_creation_order() {
        let mut ledger = ledger();
        let (alice, alice_accounts) = customer_with_accounts(&mut ledger, "Alice", 2);
        let (bob, bob_accounts) = customer_with_accounts(&mut ledger, "Bob", 1);
        let mine: Vec<_> = ledger
            .accounts_of(&alice)
            .unwrap()
            .into_iter()
            .map(|a| a.account_number().clone())
            .collect();
        assert_eq!(mine, alice_accounts);
        assert_eq!(bob_accounts, vec!["ACC000003".to_string()]);
        assert_eq!(ledger.accounts_of(&bob).unwrap().len(), 1);
    }

    #[test]
    fn test_unfundable_transfer_changes_nothing() {
        let mut ledger = ledger();
        let (session, accounts) = customer_with_accounts(&mut ledger, "Alice", 2);
        ledger.deposit(&session, &accounts[0], 100).unwrap();

        let result = ledger.transfer(&session, &accounts[0], &accounts[1], 101);
        assert!(matches!(result, Err(LedgerError::InsufficientFunds)));
        assert_eq!(ledger.balance(&session, &accounts[0]).unwrap(), 100);
        assert_eq!(ledger.balance(&session, &accounts[1]).unwrap(), 0);
        assert_eq!(ledger.get_history(&session, &accounts[1]).unwrap().len(), 0);
        assert_eq!(ledger.pending_len(), 0);
    }

    #[test]
    fn test_transfer_to_unknown_account() {
        let mut ledger = ledger();
        let (session, accounts) = customer_with_accounts(&mut ledger, "Alice", 1);
        ledger.deposit(&session, &accounts[0], 100).unwrap();
        assert!(matches!(
            ledger.transfer(&session, &accounts[0], "ACC000099", 50),
            Err(LedgerError::NotFound(_))
        ));
        assert_eq!(ledger.balance(&session, &accounts[0]).unwrap(), 100);
    }

    #[test]
    fn test_transfer_validation() {
        let mut ledger = ledger();
        let (session, accounts) = customer_with_accounts(&mut ledger, "Alice", 2);
        assert!(matches!(
            ledger.transfer(&session, &accounts[0], &accounts[1], 0),
            Err(LedgerError::InvalidAmount)
        ));
        assert!(matches!(
            ledger.transfer(&session, &accounts[0], &accounts[0], 10),
            Err(LedgerError::SameAccount)
        ));
    }

    #[test]
    fn test_transfer_conserves_total() {
        let mut ledger = ledger();
        let (session, accounts) = customer_with_accounts(&mut ledger, "Alice", 3);
        ledger.deposit(&session, &accounts[0], 1_000).unwrap();
        ledger.deposit(&session, &accounts[1], 500).unwrap();

        let total =
            |ledger: &Ledger| -> Money { ledger.all_accounts().iter().map(|a| a.balance()).sum() };
        let before = total(&ledger);
        for (from, to, amount) in [(0, 1, 300), (1, 2, 900), (2, 0, 100), (1, 0, 10_000)] {
            let _ = ledger.transfer(&session, &accounts[from], &accounts[to], amount);
            assert_eq!(total(&ledger), before);
            assert!(ledger.all_accounts().iter().all(|a| a.balance() >= 0));
        }
    }

    #[test]
    fn test_backlog_drains_priority_first() {
        let config = LedgerConfig {
            priority_threshold: 1_000,
            ..LedgerConfig::in_memory()
        };
        let mut ledger = Ledger::new(config);
        assert_eq!(ledger.config().priority_threshold, 1_000);
        let (session, accounts) = customer_with_accounts(&mut ledger, "Alice", 2);
        ledger.deposit(&session, &accounts[0], 6_000).unwrap();

        let small = ledger.submit_transfer(&session, &accounts[0], &accounts[1], 500).unwrap();
        let big = ledger.submit_transfer(&session, &accounts[0], &accounts[1], 2_000).unwrap();
        let bigger = ledger.submit_transfer(&session, &accounts[0], &accounts[1], 3_000).unwrap();
        let starved = ledger.submit_transfer(&session, &accounts[0], &accounts[1], 900).unwrap();
        assert_eq!(ledger.pending_len(), 4);

        let outcomes = ledger.drain_pending().unwrap();
        let order: Vec<_> = outcomes.iter().map(|o| o.transfer.ticket).collect();
        assert_eq!(order, vec![bigger, big, small, starved]);
        assert!(outcomes[0].transfer.priority);
        assert!(outcomes[..3].iter().all(TransferOutcome::is_applied));
        assert!(matches!(outcomes[3].result, Err(LedgerError::InsufficientFunds)));

        assert_eq!(ledger.balance(&session, &accounts[0]).unwrap(), 500);
        assert_eq!(ledger.balance(&session, &accounts[1]).unwrap(), 5_500);
        assert_eq!(ledger.pending_len(), 0);
    }

    #[test]
    fn test_search_by_balance_refreshes_index() {
        let mut ledger = ledger();
        let (session, accounts) = customer_with_accounts(&mut ledger, "Alice", 3);
        ledger.deposit(&session, &accounts[0], 100).unwrap();
        ledger.deposit(&session, &accounts[1], 300).unwrap();

        let found: Vec<_> = ledger
            .search_by_balance(50, 300)
            .into_iter()
            .map(|a| a.account_number().clone())
            .collect();
        assert_eq!(found, vec![accounts[0].clone(), accounts[1].clone()]);
        assert_eq!(ledger.search_by_balance(0, 0).len(), 1);
    }

    #[test]
    fn test_search_by_balance_without_refresh_is_historical() {
        let config = LedgerConfig {
            refresh_balance_index: false,
            ..LedgerConfig::in_memory()
        };
        let mut ledger = Ledger::new(config);
        let (session, accounts) = customer_with_accounts(&mut ledger, "Alice", 2);
        ledger.deposit(&session, &accounts[0], 100).unwrap();

        // both accounts were indexed at zero
        assert_eq!(ledger.search_by_balance(0, 0).len(), 2);
        assert!(ledger.search_by_balance(50, 150).is_empty());

        ledger.rebuild_balance_index();
        assert_eq!(ledger.search_by_balance(50, 150).len(), 1);
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let config = LedgerConfig {
            snapshot_path: Some(dir.path().join("bank_data.json")),
            ..LedgerConfig::default()
        };

        let accounts = {
            let mut ledger = Ledger::open(config.clone()).unwrap();
            let (session, accounts) = customer_with_accounts(&mut ledger, "Alice", 2);
            ledger.deposit(&session, &accounts[0], money(75.5)).unwrap();
            ledger.withdraw(&session, &accounts[0], money(0.5)).unwrap();
            ledger.transfer(&session, &accounts[0], &accounts[1], money(25.0)).unwrap();
            accounts
        };

        let mut ledger = Ledger::open(config).unwrap();
        let mut session = Session::anonymous();
        assert!(matches!(
            ledger.authenticate(&mut session, "CUST0001", "nope12345"),
            Err(LedgerError::AuthFailed)
        ));
        ledger.authenticate(&mut session, "CUST0001", "abcd1234").unwrap();
        assert_eq!(ledger.balance(&session, &accounts[0]).unwrap(), money(50.0));
        assert_eq!(ledger.balance(&session, &accounts[1]).unwrap(), money(25.0));

        let kinds: Vec<_> = ledger
            .get_history(&session, &accounts[0])
            .unwrap()
            .into_iter()
            .map(|r| r.kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                TransactionKind::Deposit,
                TransactionKind::Withdrawal,
                TransactionKind::TransferOut
            ]
        );
        assert_eq!(ledger.accounts_of(&session).unwrap().len(), 2);

        // ids keep counting from the restored state
        assert_eq!(ledger.create_account(&session).unwrap(), "ACC000003");
        assert_eq!(ledger.register("Bob", "abcd1234").unwrap(), "CUST0002");
        assert_eq!(ledger.search_by_balance(money(50.0), money(50.0)).len(), 1);
    }

    #[test]
    fn test_ids_skip_existing_entries() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{
                "customers": [
                    {"customer_id": "CUST0002", "name": "Zed", "password_hash": "x"}
                ],
                "accounts": [
                    {"account_number": "ACC000002", "customer_id": "CUST0002", "balance": 0.0}
                ]
            }"#,
        )
        .unwrap();
        let mut ledger = Ledger::from_snapshot(LedgerConfig::in_memory(), snapshot).unwrap();
        assert_eq!(ledger.register("Amy", "abcd1234").unwrap(), "CUST0003");
        assert_eq!(ledger.account("ACC000002").unwrap().customer_id(), "CUST0002");
    }

    #[test]
    fn test_open_rejects_inconsistent_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bank_data.json");
        std::fs::write(
            &path,
            r#"{
                "customers": [],
                "accounts": [
                    {"account_number": "ACC000001", "customer_id": "CUST0001", "balance": 1.0}
                ]
            }"#,
        )
        .unwrap();
        let config = LedgerConfig {
            snapshot_path: Some(path),
            ..LedgerConfig::default()
        };
        assert!(matches!(
            Ledger::open(config),
            Err(LedgerError::Snapshot(SnapshotError::OrphanAccount { .. }))
        ));
    }
}
