use bank_ledger::bank::{self, Ledger, LedgerConfig};
use csv::{ReaderBuilder, Trim};
use tokio::sync::mpsc;

/// The size of the channel for processing commands.
const CHANNEL_SIZE: usize = 100;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args = std::env::args().collect::<Vec<_>>();
    if args.len() != 2 {
        eprintln!("Usage: {} <command_csv_file>", args[0]);
        std::process::exit(1);
    }
    let input_file = &args[1];

    let config = LedgerConfig::from_env().unwrap_or_else(|err| {
        eprintln!("Invalid configuration: {err}");
        std::process::exit(1);
    });
    let ledger = Ledger::open(config).unwrap_or_else(|err| {
        eprintln!("Failed to open ledger: {err}");
        std::process::exit(1);
    });

    let (sender, receiver) = mpsc::channel(CHANNEL_SIZE);
    let mut state = bank::State::new(ledger, receiver);

    let handle = tokio::spawn(async move {
        state.run().await;
        state
    });

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(input_file)
        .unwrap_or_else(|err| {
            eprintln!("Failed to read CSV file: {err}");
            std::process::exit(1);
        });

    for command in reader.deserialize::<bank::Command>() {
        match command {
            Ok(command) => {
                if let Err(err) = sender.send(command).await {
                    eprintln!("Error sending command: {err}");
                }
            }
            Err(err) => eprintln!("Skipping malformed row: {err}"),
        }
    }

    drop(sender); // Close the sender to signal no more commands will be sent
    let state = handle
        .await
        .expect("Failed to join the state handling task");

    let mut writer = csv::Writer::from_writer(std::io::stdout());
    for account in state.ledger().all_accounts() {
        if let Err(err) = writer.serialize(account) {
            eprintln!("Error writing account: {err}");
        }
    }
    if let Err(err) = writer.flush() {
        eprintln!("Error flushing output: {err}");
    }
}
