//! The `State` module feeds scripted commands into a ledger, one at a time.
use std::fmt;

use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::bank::{
    AccountNumber, CommandError, CustomerId, Ledger, Money, Session, TransactionRecord,
    money_to_f64, parse_money, types::deserialize_optional_money,
};

/// Enum representing the operation of a scripted command.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Register,
    Login,
    Logout,
    Open,
    Deposit,
    Withdraw,
    Transfer,
    History,
    Search,
}

/// One row of a command script: `op,subject,target,amount`.
///
/// | op | subject | target | amount |
/// |----|---------|--------|--------|
/// | register | name | password | |
/// | login | customer id | password | |
/// | deposit / withdraw / history | account | | amount |
/// | transfer | from account | to account | amount |
/// | search | low balance | high balance | |
#[derive(Deserialize, Debug, Clone)]
pub struct Command {
    #[serde(rename = "op")]
    kind: CommandKind,

    #[serde(default)]
    subject: Option<String>,

    #[serde(default)]
    target: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_money")]
    amount: Option<Money>,
}

impl Command {
    pub fn new(
        kind: CommandKind,
        subject: Option<&str>,
        target: Option<&str>,
        amount: Option<Money>,
    ) -> Self {
        Command {
            kind,
            subject: subject.map(str::to_string),
            target: target.map(str::to_string),
            amount,
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    fn subject(&self) -> Result<&str, CommandError> {
        self.subject
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(CommandError::MissingField("subject"))
    }

    fn target(&self) -> Result<&str, CommandError> {
        self.target
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(CommandError::MissingField("target"))
    }

    fn amount(&self) -> Result<Money, CommandError> {
        self.amount.ok_or(CommandError::MissingField("amount"))
    }
}

/// Result of a successfully processed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Registered(CustomerId),
    LoggedIn(CustomerId),
    LoggedOut,
    Opened(AccountNumber),
    Balance(Money),
    Transferred,
    History(Vec<TransactionRecord>),
    Found(Vec<AccountNumber>),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Registered(id) => write!(f, "registered {id}"),
            Reply::LoggedIn(id) => write!(f, "logged in as {id}"),
            Reply::LoggedOut => write!(f, "logged out"),
            Reply::Opened(number) => write!(f, "opened {number}"),
            Reply::Balance(balance) => write!(f, "balance {}", money_to_f64(*balance)),
            Reply::Transferred => write!(f, "transfer applied"),
            Reply::History(records) => write!(f, "{} history records", records.len()),
            Reply::Found(accounts) => write!(f, "found [{}]", accounts.join(", ")),
        }
    }
}

/// Owns the ledger and the single active session of a scripted run.
pub struct State {
    ledger: Ledger,
    session: Session,
    /// A channel receiver for incoming commands.
    receiver: mpsc::Receiver<Command>,
}

impl State {
    pub fn new(ledger: Ledger, receiver: mpsc::Receiver<Command>) -> Self {
        State {
            ledger,
            session: Session::anonymous(),
            receiver,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Applies one command to the ledger.
    pub fn process_command(&mut self, command: Command) -> Result<Reply, CommandError> {
        let ledger = &mut self.ledger;
        let session = &mut self.session;
        let reply = match command.kind {
            CommandKind::Register => {
                Reply::Registered(ledger.register(command.subject()?, command.target()?)?)
            }
            CommandKind::Login => {
                let customer_id = command.subject()?;
                ledger.authenticate(session, customer_id, command.target()?)?;
                Reply::LoggedIn(customer_id.to_string())
            }
            CommandKind::Logout => {
                session.logout();
                Reply::LoggedOut
            }
            CommandKind::Open => Reply::Opened(ledger.create_account(session)?),
            CommandKind::Deposit => {
                Reply::Balance(ledger.deposit(session, command.subject()?, command.amount()?)?)
            }
            CommandKind::Withdraw => {
                Reply::Balance(ledger.withdraw(session, command.subject()?, command.amount()?)?)
            }
            CommandKind::Transfer => {
                ledger.transfer(session, command.subject()?, command.target()?, command.amount()?)?;
                Reply::Transferred
            }
            CommandKind::History => Reply::History(
                ledger
                    .get_history(session, command.subject()?)?
                    .into_iter()
                    .cloned()
                    .collect(),
            ),
            CommandKind::Search => {
                let low = parse_bound(command.subject()?)?;
                let high = parse_bound(command.target()?)?;
                Reply::Found(
                    ledger
                        .search_by_balance(low, high)
                        .into_iter()
                        .map(|account| account.account_number().clone())
                        .collect(),
                )
            }
        };
        Ok(reply)
    }

    /// Runs the command loop until every sender is dropped.
    pub async fn run(&mut self) {
        while let Some(command) = self.receiver.recv().await {
            let kind = command.kind();
            match self.process_command(command) {
                Ok(reply) => info!(command = ?kind, %reply, "Command processed"),
                Err(err) => warn!(command = ?kind, error = %err, "Command failed"),
            }
        }
    }
}

fn parse_bound(text: &str) -> Result<Money, CommandError> {
    parse_money(text).ok_or_else(|| CommandError::InvalidAmount(text.to_string()))
}
