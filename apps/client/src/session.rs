//! The interactive session: one `select!` loop over stdin and the server
//! connection, mirroring the server's per-session state on this side.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use parley_proto::payload::{
    Broadcast, BroadcastReq, Empty, FileTransferReady, FileTransferReq, ListResp, Presence,
    PrivateMsg, PrivateMsgReq, RpsInvite, RpsInviteResp, RpsMoveReq, RpsResult, RpsStartReq,
    RpsStartResp, Status, StatusResp, TransferRole,
};
use parley_proto::{decode, encode, Command};

use crate::config::Config;
use crate::input::{self, UserInput};
use crate::transfer;

pub type ServerLines = Lines<BufReader<OwnedReadHalf>>;
pub type StdinLines = Lines<BufReader<Stdin>>;

/// Whether the session loop keeps going.
#[derive(PartialEq)]
enum Flow {
    Continue,
    Exit,
}

/// An interactive prompt that captures the next stdin line.
enum Prompt {
    RpsOpponent,
}

/// Client-side session state: who we are, which file requests are pending on
/// us, and where the files we offered actually live.
pub struct ClientSession {
    config: Config,
    username: String,
    writer: OwnedWriteHalf,
    incoming_requests: Vec<FileTransferReq>,
    file_paths: HashMap<String, PathBuf>,
    prompt: Option<Prompt>,
}

/// Writes one `COMMAND JSON\n` frame.
pub async fn send_frame<T: Serialize>(
    writer: &mut OwnedWriteHalf,
    command: Command,
    payload: &T,
) -> io::Result<()> {
    let mut frame = encode(command, payload);
    frame.push('\n');
    writer.write_all(frame.as_bytes()).await
}

impl ClientSession {
    pub fn new(config: Config, username: String, writer: OwnedWriteHalf) -> Self {
        Self {
            config,
            username,
            writer,
            incoming_requests: Vec::new(),
            file_paths: HashMap::new(),
            prompt: None,
        }
    }

    /// Runs until the server closes the connection, hangs up, or the user
    /// exits.
    pub async fn run(
        mut self,
        mut server_lines: ServerLines,
        mut stdin_lines: StdinLines,
    ) -> io::Result<()> {
        loop {
            tokio::select! {
                line = server_lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if self.handle_server_frame(&line).await? == Flow::Exit {
                            break;
                        }
                    }
                    Ok(None) => {
                        println!("Connection closed by server.");
                        break;
                    }
                    Err(e) => {
                        println!("Connection to server lost: {e}");
                        break;
                    }
                },
                line = stdin_lines.next_line() => match line {
                    Ok(Some(line)) => self.handle_user_input(&line).await?,
                    Ok(None) | Err(_) => break,
                },
            }
        }
        Ok(())
    }

    async fn send<T: Serialize>(&mut self, command: Command, payload: &T) -> io::Result<()> {
        send_frame(&mut self.writer, command, payload).await
    }

    // -- server frames ------------------------------------------------------

    async fn handle_server_frame(&mut self, line: &str) -> io::Result<Flow> {
        let Ok((command, payload)) = decode(line) else {
            println!("Unknown server message: {line}");
            return Ok(Flow::Continue);
        };

        match command {
            Command::Ping => self.send(Command::Pong, &Empty {}).await?,
            Command::Hangup => {
                println!("Server hung up after a missed heartbeat check.");
                return Ok(Flow::Exit);
            }
            Command::ByeResp => {
                println!("Disconnected. Bye!");
                return Ok(Flow::Exit);
            }

            Command::Broadcast => {
                if let Some(msg) = parse_payload::<Broadcast>(payload) {
                    println!("{}: {}", msg.username, msg.message);
                }
            }
            Command::BroadcastResp => {
                if let Some(resp) = parse_payload::<StatusResp>(payload) {
                    match resp.status {
                        Status::Ok => println!("Sent ✔"),
                        _ => println!("You must log in before broadcasting."),
                    }
                }
            }
            Command::Joined => {
                if let Some(p) = parse_payload::<Presence>(payload) {
                    println!("{} has joined the chat.", p.username);
                }
            }
            Command::Left => {
                if let Some(p) = parse_payload::<Presence>(payload) {
                    println!("{} has left the chat.", p.username);
                }
            }
            Command::ListResp => {
                if let Some(resp) = parse_payload::<ListResp>(payload) {
                    self.show_client_list(resp);
                }
            }

            Command::PrivateMsg => {
                if let Some(msg) = parse_payload::<PrivateMsg>(payload) {
                    println!("[PRIVATE] {}: {}", msg.sender, msg.message);
                }
            }
            Command::PrivateMsgResp => {
                if let Some(resp) = parse_payload::<StatusResp>(payload) {
                    match (resp.status, resp.code) {
                        (Status::Ok, _) => println!("Sent ✔"),
                        (_, Some(10001)) => println!("Please log in to send private messages."),
                        (_, Some(10002)) => println!("No receiver found."),
                        (_, Some(10003)) => println!("Can't send a private message to yourself."),
                        (_, code) => println!("Private message failed (code {code:?})."),
                    }
                }
            }

            Command::RpsStartResp => {
                if let Some(resp) = parse_payload::<RpsStartResp>(payload) {
                    self.show_rps_start_response(resp);
                }
            }
            Command::RpsInvite => {
                if let Some(invite) = parse_payload::<RpsInvite>(payload) {
                    println!("You have been invited to a game by {}.", invite.sender);
                    println!("/y - accept");
                    println!("/n - decline");
                }
            }
            Command::RpsInviteDeclined => println!("Game invitation declined."),
            Command::RpsReady => println!("Game on! Select your move: /r, /p, /s"),
            Command::RpsMoveResp => {
                if let Some(resp) = parse_payload::<StatusResp>(payload) {
                    match (resp.status, resp.code) {
                        (Status::Ok, _) => println!("Move sent ✔"),
                        (_, Some(11005)) => println!("No ongoing game."),
                        (_, code) => println!("Move rejected (code {code:?})."),
                    }
                }
            }
            Command::RpsResult => {
                if let Some(result) = parse_payload::<RpsResult>(payload) {
                    self.show_rps_result(result);
                }
            }

            Command::FileTransferReq => {
                if let Some(req) = parse_payload::<FileTransferReq>(payload) {
                    println!(
                        "New file transfer request from {}: {} (/a {} {} to accept)",
                        req.sender, req.filename, req.sender, req.filename
                    );
                    self.incoming_requests.push(req);
                }
            }
            Command::FileTransferResp => {
                if let Some(resp) = parse_payload::<StatusResp>(payload) {
                    match (resp.status, resp.code) {
                        (Status::Ok, _) => println!("File transfer request sent ✔"),
                        (Status::Decline, _) => println!("File request declined."),
                        (_, Some(13000)) => println!("Please log in first."),
                        (_, Some(13001)) => println!("No receiver found."),
                        (_, Some(13002)) => println!("Can't send a file to yourself."),
                        (_, code) => println!("File transfer failed (code {code:?})."),
                    }
                }
            }
            Command::FileTransferReady => {
                if let Some(ready) = parse_payload::<FileTransferReady>(payload) {
                    self.start_transfer(ready);
                }
            }

            Command::PongError => println!("Server reported an unexpected PONG."),
            Command::UnknownCommand => println!("The server did not understand the last command."),
            Command::ParseError => println!("The server could not parse the last payload."),

            _ => println!("Unknown server message: {line}"),
        }
        Ok(Flow::Continue)
    }

    fn show_client_list(&self, resp: ListResp) {
        match (resp.status, resp.code) {
            (Status::Ok, _) => {
                let clients = resp.clients.unwrap_or_default();
                if clients.is_empty() {
                    println!("(no users connected?)");
                } else {
                    println!("Currently connected users: {}", clients.join(", "));
                }
            }
            (_, Some(9000)) => println!("Cannot retrieve the list: you are not logged in."),
            (_, code) => println!("List request failed (code {code:?})."),
        }
    }

    fn show_rps_start_response(&self, resp: RpsStartResp) {
        match (resp.status, resp.code) {
            (Status::Ok, _) => println!("Invitation sent ✔"),
            (_, Some(11001)) => println!("You need to log in first."),
            (_, Some(11002)) => println!("No opponent found."),
            (_, Some(11003)) => println!("Can't challenge yourself."),
            (_, Some(11004)) => println!(
                "A game is already ongoing between {} and {}.",
                resp.player1.as_deref().unwrap_or("?"),
                resp.player2.as_deref().unwrap_or("?"),
            ),
            (_, code) => println!("Game request failed (code {code:?})."),
        }
    }

    fn show_rps_result(&self, result: RpsResult) {
        for (player, choice) in &result.choices {
            println!("{player} played {choice}.");
        }
        match result.winner {
            Some(winner) if winner == self.username => println!("You win!"),
            Some(winner) => println!("The winner is {winner}."),
            None => println!("It's a tie!"),
        }
    }

    /// Spawns the out-of-band transfer for a FILE_TRANSFER_READY, on
    /// whichever side this client is.
    fn start_transfer(&mut self, ready: FileTransferReady) {
        let config = self.config.clone();
        match ready.role {
            TransferRole::Sender => {
                let Some(path) = self.file_paths.get(&ready.filename).cloned() else {
                    println!("No stored path for {}.", ready.filename);
                    return;
                };
                println!("Receiver accepted {}. Uploading…", ready.filename);
                tokio::spawn(async move {
                    if let Err(e) = transfer::send_file(&config, &ready.uuid, &path).await {
                        println!("Error while sending {}: {e}", ready.filename);
                    }
                });
            }
            TransferRole::Receiver => {
                println!("Downloading {}…", ready.filename);
                tokio::spawn(async move {
                    if let Err(e) =
                        transfer::receive_file(&config, &ready.uuid, &ready.filename, &ready.checksum)
                            .await
                    {
                        println!("Error while downloading {}: {e}", ready.filename);
                    }
                });
            }
        }
    }

    // -- user input ---------------------------------------------------------

    async fn handle_user_input(&mut self, line: &str) -> io::Result<()> {
        if self.prompt.take().is_some() {
            // The pending prompt consumes this line as the RPS opponent.
            let opponent = line.trim();
            if opponent.is_empty() {
                println!("Game request cancelled.");
            } else {
                self.send(
                    Command::RpsStartReq,
                    &RpsStartReq {
                        receiver: opponent.to_string(),
                    },
                )
                .await?;
            }
            return Ok(());
        }

        match input::parse(line) {
            UserInput::Help => print_help(),
            UserInput::Exit => self.send(Command::Bye, &Empty {}).await?,
            UserInput::ListClients => self.send(Command::ListReq, &Empty {}).await?,
            UserInput::PrivateMsg { receiver, message } => {
                self.send(Command::PrivateMsgReq, &PrivateMsgReq { receiver, message })
                    .await?;
            }
            UserInput::StartRps => {
                self.send(Command::ListReq, &Empty {}).await?;
                println!("Enter your opponent:");
                self.prompt = Some(Prompt::RpsOpponent);
            }
            UserInput::AcceptInvite => {
                self.send(
                    Command::RpsInviteResp,
                    &RpsInviteResp {
                        status: Status::Accept,
                    },
                )
                .await?;
                println!("Invitation accepted.");
            }
            UserInput::DeclineInvite => {
                self.send(
                    Command::RpsInviteResp,
                    &RpsInviteResp {
                        status: Status::Decline,
                    },
                )
                .await?;
                println!("Invitation declined.");
            }
            UserInput::PlayMove(choice) => {
                self.send(Command::RpsMoveReq, &RpsMoveReq { choice }).await?;
            }
            UserInput::SendFile { receiver, path } => {
                self.request_file_transfer(receiver, path).await?;
            }
            UserInput::ShowFileRequests => self.show_file_requests(),
            UserInput::AcceptFile { sender, filename } => {
                self.answer_file_request(&sender, &filename, true).await?;
            }
            UserInput::DeclineFile { sender, filename } => {
                self.answer_file_request(&sender, &filename, false).await?;
            }
            UserInput::Broadcast(message) => {
                self.send(Command::BroadcastReq, &BroadcastReq { message })
                    .await?;
            }
            UserInput::Invalid(usage) => println!("Invalid command. {usage}"),
            UserInput::Empty => {}
        }
        Ok(())
    }

    async fn request_file_transfer(&mut self, receiver: String, path: String) -> io::Result<()> {
        let path = PathBuf::from(path);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                println!("File does not exist or is not a regular file.");
                return Ok(());
            }
        }
        let Some(filename) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            println!("Invalid file path.");
            return Ok(());
        };

        let checksum = match transfer::checksum_file(&path).await {
            Ok(checksum) => checksum,
            Err(e) => {
                println!("Could not read {}: {e}", path.display());
                return Ok(());
            }
        };

        self.file_paths.insert(filename.clone(), path);
        let request = FileTransferReq {
            sender: self.username.clone(),
            receiver,
            filename,
            checksum,
        };
        self.send(Command::FileTransferReq, &request).await
    }

    fn show_file_requests(&self) {
        if self.incoming_requests.is_empty() {
            println!("No file requests to show.");
            return;
        }
        println!("--- File requests ---");
        for (i, req) in self.incoming_requests.iter().enumerate() {
            println!("{}. from {}: {}", i + 1, req.sender, req.filename);
        }
    }

    async fn answer_file_request(
        &mut self,
        sender: &str,
        filename: &str,
        accept: bool,
    ) -> io::Result<()> {
        let Some(index) = self
            .incoming_requests
            .iter()
            .position(|r| r.sender == sender && r.filename == filename)
        else {
            println!("No matching file request.");
            return Ok(());
        };
        self.incoming_requests.remove(index);

        if accept {
            println!("Accepted {filename} from {sender}.");
            self.send(
                Command::FileTransferResp,
                &StatusResp {
                    status: Status::Accept,
                    code: None,
                },
            )
            .await
        } else {
            println!("Declined {filename} from {sender}.");
            self.send(
                Command::FileTransferResp,
                &StatusResp::declined(),
            )
            .await
        }
    }
}

fn parse_payload<T: DeserializeOwned>(payload: &str) -> Option<T> {
    match serde_json::from_str(payload) {
        Ok(value) => Some(value),
        Err(_) => {
            println!("Malformed payload from server.");
            None
        }
    }
}

pub fn print_help() {
    println!("Available commands:");
    println!("----------------------------");
    println!("/help - Show this help menu");
    println!("/exit - Leave the chat");
    println!("/all - Show all connected clients");
    println!("@username <message> - Send a private message");
    println!("/rps - Start a Rock, Paper, Scissors game");
    println!("/send <username> <file-path> - Offer a file to another user");
    println!("/files - Show incoming file requests");
    println!("/a <username> <filename> - Accept a file request");
    println!("/d <username> <filename> - Decline a file request");
    println!("Anything else is broadcast to the room.");
}
