// Raw TCP transport: newline-delimited JSON in both directions.
// One task per connection reads inbound lines and forwards them to the
// authority as `AuthorityCommand`s; a second, serialized writer task owns
// the socket's write half and drains the authority's per-connection
// outbox. Malformed lines are dropped, never fatal: one bad client message
// shouldn't take down a session.

use crate::interface_adapters::protocol::{duel_id_from, player_id_from, ClientMessage, ServerMessage};
use crate::use_cases::types::{AuthorityCommand, ConnectOutcome, Outbound};
use crate::use_cases::AuthorityHandle;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

const OUTBOX_CAPACITY: usize = 256;

/// Per-connection traffic counters, logged when the connection closes.
#[derive(Default)]
struct ConnStats {
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u64,
}

pub async fn run_listener(addr: SocketAddr, authority: AuthorityHandle) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "game listener bound");
    loop {
        let (socket, peer) = listener.accept().await?;
        let authority = authority.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(socket, peer, authority).await {
                debug!(%peer, error = %err, "connection closed with error");
            }
        });
    }
}

async fn handle_connection(socket: TcpStream, peer: SocketAddr, authority: AuthorityHandle) -> std::io::Result<()> {
    socket.set_nodelay(true).ok();
    let (read_half, mut write_half) = socket.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let player_id = player_id_from(&format!("p-{}", crate::domain::rng::random_seed_hex()));
    let (outbox_tx, mut outbox_rx) = mpsc::channel::<Outbound>(OUTBOX_CAPACITY);
    let (reply_tx, reply_rx) = oneshot::channel();

    if authority
        .sender
        .send(AuthorityCommand::Connect { player_id: player_id.clone(), outbox: outbox_tx, reply: reply_tx })
        .await
        .is_err()
    {
        return Ok(());
    }

    let mut stats = ConnStats::default();
    match reply_rx.await {
        Ok(ConnectOutcome::Welcome { .. }) => {
            info!(%peer, player_id = %player_id, "connection accepted");
        }
        Ok(ConnectOutcome::Rejected { match_active, lobby_locked }) => {
            let reason = if match_active { "match_active" } else if lobby_locked { "lobby_locked" } else { "rejected" };
            let line = serde_json::to_string(&ServerMessage::Reject { reason }).unwrap_or_default();
            let _ = write_half.write_all(format!("{line}\n").as_bytes()).await;
            return Ok(());
        }
        Err(_) => return Ok(()),
    }

    let writer_player_id = player_id.clone();
    let writer = tokio::spawn(async move {
        let mut out_stats = (0u64, 0u64);
        while let Some(outbound) = outbox_rx.recv().await {
            let msg: ServerMessage = outbound.event.into();
            match serde_json::to_string(&msg) {
                Ok(line) => {
                    let bytes = line.len() as u64 + 1;
                    if write_half.write_all(format!("{line}\n").as_bytes()).await.is_err() {
                        break;
                    }
                    out_stats.0 += 1;
                    out_stats.1 += bytes;
                }
                Err(err) => warn!(player_id = %writer_player_id, error = %err, "failed to serialize outbound message"),
            }
        }
        out_stats
    });

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                debug!(%peer, error = %err, "read error, closing connection");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        stats.msgs_in += 1;
        stats.bytes_in += line.len() as u64;

        match serde_json::from_str::<ClientMessage>(&line) {
            Ok(msg) => {
                if let Some(cmd) = to_command(player_id.clone(), msg) {
                    if authority.sender.send(cmd).await.is_err() {
                        break;
                    }
                }
            }
            Err(err) => {
                stats.invalid_json += 1;
                debug!(%peer, error = %err, "dropping malformed client message");
            }
        }
    }

    let _ = authority.sender.send(AuthorityCommand::Disconnect { player_id: player_id.clone() }).await;
    drop(lines);
    if let Ok((msgs_out, bytes_out)) = writer.await {
        stats.msgs_out = msgs_out;
        stats.bytes_out = bytes_out;
    }
    info!(
        %peer,
        player_id = %player_id,
        msgs_in = stats.msgs_in,
        msgs_out = stats.msgs_out,
        bytes_in = stats.bytes_in,
        bytes_out = stats.bytes_out,
        invalid_json = stats.invalid_json,
        "connection closed"
    );
    Ok(())
}

fn to_command(player_id: crate::domain::PlayerId, msg: ClientMessage) -> Option<AuthorityCommand> {
    use ClientMessage::*;
    Some(match msg {
        Hello { name } => AuthorityCommand::Hello { player_id, name },
        SetReady { ready } => AuthorityCommand::SetReady { player_id, ready },
        SetChar { char_name } => AuthorityCommand::SetChar { player_id, char_name },
        SetMap { .. } | SetMode { .. } | SetAllowNpc { .. } => return None,
        StartMatch { seed } => AuthorityCommand::StartMatch { player_id, seed },
        Input { x, y } | MatchInput { x, y } => AuthorityCommand::Input { player_id, vec: (x, y) },
        RequestDuel { target } => AuthorityCommand::RequestDuel { player_id, target: player_id_from(&target) },
        DuelChoice { duel_id, entry } => {
            AuthorityCommand::DuelChoice { player_id, duel_id: duel_id_from(&duel_id), entry }
        }
        DuelAction { duel_id, payload } => {
            AuthorityCommand::DuelAction { player_id, duel_id: duel_id_from(&duel_id), payload }
        }
        DuelResult { duel_id, outcome, winner, loser, entry } => AuthorityCommand::DuelResultReport {
            player_id,
            duel_id: duel_id_from(&duel_id),
            outcome,
            winner: winner.map(|w| player_id_from(&w)),
            loser: loser.map(|l| player_id_from(&l)),
            entry,
        },
        StartMinigame { minigame, participants, duel_id } => AuthorityCommand::StartMinigame {
            player_id,
            minigame,
            participants: participants.iter().map(|p| player_id_from(p)).collect(),
            duel_id: duel_id.map(|d| duel_id_from(&d)),
        },
        MinigameResult { payload } => AuthorityCommand::MinigameResult { player_id, payload },
        DebugStartDuel { target } => {
            AuthorityCommand::DebugStartDuel { player_id, target: target.map(|t| player_id_from(&t)) }
        }
    })
}
