mod commands;
mod render;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use parley_client::{ChatClient, ClientConfig, ClientError};

use commands::Command;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so they do not interleave with the chat on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env()?;
    info!("Session store at {}", config.session_db.display());
    info!("Polling every {:?}", config.poll_interval);

    let client = ChatClient::from_config(&config)?;
    let renderer = tokio::spawn(render::run(client.clone(), client.subscribe()));

    if client.restore_session().await.is_none() {
        println!("{}", commands::HELP);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(usage) => {
                println!("! {}", usage);
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }
        if let Err(e) = dispatch(&client, command).await {
            println!("! {}", e);
        }
    }

    client.shutdown();
    renderer.abort();
    Ok(())
}

async fn dispatch(client: &ChatClient, command: Command) -> Result<(), ClientError> {
    match command {
        Command::Login(credentials) => client.login(credentials).await.map(drop),
        Command::Register(credentials) => client.register(credentials).await.map(drop),
        Command::Logout => client.logout().await,
        Command::Servers => {
            render::print_servers(&client.snapshot());
            Ok(())
        }
        Command::Server(id) => client.select_server(id),
        Command::Channel(id) => client.select_channel(id),
        Command::Contacts => {
            client.show_contacts();
            render::print_contacts(&client.snapshot());
            Ok(())
        }
        Command::Help => {
            println!("{}", commands::HELP);
            Ok(())
        }
        Command::Say(text) => {
            client.set_draft(text);
            client.send_message().await
        }
        Command::Quit => Ok(()),
    }
}
