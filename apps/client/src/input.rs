//! Parsing of interactive user input into actions.
//!
//! `@user <msg>` addresses a private message, slash commands drive the
//! features, and anything else is broadcast to the room.

use parley_proto::rps::Move;

/// One line of user input, classified.
#[derive(Debug, PartialEq, Eq)]
pub enum UserInput {
    Help,
    Exit,
    ListClients,
    PrivateMsg { receiver: String, message: String },
    StartRps,
    AcceptInvite,
    DeclineInvite,
    PlayMove(Move),
    SendFile { receiver: String, path: String },
    ShowFileRequests,
    AcceptFile { sender: String, filename: String },
    DeclineFile { sender: String, filename: String },
    Broadcast(String),
    /// Recognized command with bad arguments; carries the usage hint.
    Invalid(&'static str),
    /// Blank line, nothing to do.
    Empty,
}

pub fn parse(line: &str) -> UserInput {
    if line.trim().is_empty() {
        return UserInput::Empty;
    }

    if let Some(rest) = line.strip_prefix('@') {
        return match rest.split_once(' ') {
            Some((receiver, message)) if !receiver.is_empty() && !message.trim().is_empty() => {
                UserInput::PrivateMsg {
                    receiver: receiver.to_string(),
                    message: message.to_string(),
                }
            }
            _ => UserInput::Invalid("Use @username <message>"),
        };
    }

    if let Some(rest) = line.strip_prefix("/send ") {
        return match rest.split_once(' ') {
            Some((receiver, path)) if !receiver.is_empty() && !path.is_empty() => {
                UserInput::SendFile {
                    receiver: receiver.to_string(),
                    path: path.to_string(),
                }
            }
            _ => UserInput::Invalid("Use /send <username> <file-path>"),
        };
    }
    if let Some(rest) = line.strip_prefix("/a ") {
        return parse_file_answer(rest, true);
    }
    if let Some(rest) = line.strip_prefix("/d ") {
        return parse_file_answer(rest, false);
    }

    match line.trim_end() {
        "/send" => UserInput::Invalid("Use /send <username> <file-path>"),
        "/a" => UserInput::Invalid("Use /a <username> <filename>"),
        "/d" => UserInput::Invalid("Use /d <username> <filename>"),
        "/help" => UserInput::Help,
        "/exit" => UserInput::Exit,
        "/all" => UserInput::ListClients,
        "/rps" => UserInput::StartRps,
        "/y" => UserInput::AcceptInvite,
        "/n" => UserInput::DeclineInvite,
        "/r" => UserInput::PlayMove(Move::Rock),
        "/p" => UserInput::PlayMove(Move::Paper),
        "/s" => UserInput::PlayMove(Move::Scissors),
        "/files" => UserInput::ShowFileRequests,
        other => UserInput::Broadcast(other.to_string()),
    }
}

fn parse_file_answer(rest: &str, accept: bool) -> UserInput {
    match rest.split_once(' ') {
        Some((sender, filename)) if !sender.is_empty() && !filename.is_empty() => {
            let sender = sender.to_string();
            let filename = filename.to_string();
            if accept {
                UserInput::AcceptFile { sender, filename }
            } else {
                UserInput::DeclineFile { sender, filename }
            }
        }
        _ => {
            if accept {
                UserInput::Invalid("Use /a <username> <filename>")
            } else {
                UserInput::Invalid("Use /d <username> <filename>")
            }
        }
    }
}
