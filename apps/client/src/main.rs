mod config;
mod input;
mod session;
mod transfer;

use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;

use parley_proto::payload::{Enter, Ready, Status, StatusResp};
use parley_proto::{decode, Command};

use config::Config;
use session::{send_frame, ClientSession, ServerLines, StdinLines};

#[tokio::main]
async fn main() {
    // Load .env if present; env vars may be set externally.
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    let stream = match TcpStream::connect((config.server_host.as_str(), config.control_port)).await
    {
        Ok(stream) => stream,
        Err(e) => {
            println!(
                "Could not connect to {}:{}: {e}",
                config.server_host, config.control_port
            );
            return;
        }
    };
    let (read_half, write_half) = stream.into_split();
    let mut server_lines = BufReader::new(read_half).lines();
    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();
    let mut writer = write_half;

    if !await_greeting(&mut server_lines).await {
        return;
    }

    let Some(username) = login(&mut server_lines, &mut stdin_lines, &mut writer).await else {
        return;
    };

    println!("You are now in chat mode.");
    session::print_help();

    let session = ClientSession::new(config, username, writer);
    if let Err(e) = session.run(server_lines, stdin_lines).await {
        println!("Session ended with an error: {e}");
    }
}

/// Reads the server's READY greeting; anything else aborts the connection.
async fn await_greeting(server_lines: &mut ServerLines) -> bool {
    let line = match server_lines.next_line().await {
        Ok(Some(line)) => line,
        Ok(None) => {
            println!("Failed to connect: no response from server.");
            return false;
        }
        Err(e) => {
            println!("Failed to connect: {e}");
            return false;
        }
    };

    match decode(&line) {
        Ok((Command::Ready, payload)) => match serde_json::from_str::<Ready>(payload) {
            Ok(ready) => {
                println!("Connected to server (version {}).", ready.version);
                true
            }
            Err(_) => {
                println!("Unexpected greeting from server.");
                false
            }
        },
        _ => {
            println!("Unexpected response from server.");
            false
        }
    }
}

/// Prompts for a username until the server accepts one. Returns `None` when
/// either stream ends first.
async fn login(
    server_lines: &mut ServerLines,
    stdin_lines: &mut StdinLines,
    writer: &mut OwnedWriteHalf,
) -> Option<String> {
    loop {
        print!("Enter username: ");
        std::io::stdout().flush().ok();

        let username = match stdin_lines.next_line().await {
            Ok(Some(line)) => line.trim().to_string(),
            _ => return None,
        };
        if send_frame(
            writer,
            Command::Enter,
            &Enter {
                username: username.clone(),
            },
        )
        .await
        .is_err()
        {
            println!("Lost connection to server.");
            return None;
        }

        let reply = match server_lines.next_line().await {
            Ok(Some(line)) => line,
            _ => {
                println!("No response from server.");
                return None;
            }
        };

        let resp = match decode(&reply) {
            Ok((Command::EnterResp, payload)) => {
                match serde_json::from_str::<StatusResp>(payload) {
                    Ok(resp) => resp,
                    Err(_) => {
                        println!("Unexpected response from server.");
                        continue;
                    }
                }
            }
            _ => {
                println!("Unexpected response from server.");
                continue;
            }
        };

        match (resp.status, resp.code) {
            (Status::Ok, _) => {
                println!("Logged in as {username}.");
                return Some(username);
            }
            (_, Some(5000)) => println!("A user with this name already exists."),
            (_, Some(5001)) => {
                println!("A username is 3-14 letters, digits, or underscores.")
            }
            (_, Some(5002)) => println!("You are already logged in."),
            (_, code) => println!("Login failed (code {code:?})."),
        }
    }
}
