mod support;

use tokio::io::{AsyncBufReadExt, BufReader};

async fn connect(addr: std::net::SocketAddr) -> (BufReader<tokio::net::tcp::OwnedReadHalf>, tokio::net::tcp::OwnedWriteHalf) {
    let stream = tokio::net::TcpStream::connect(addr).await.expect("connect to game listener");
    let (read_half, write_half) = stream.into_split();
    (BufReader::new(read_half), write_half)
}

async fn send_line(write_half: &mut tokio::net::tcp::OwnedWriteHalf, line: &str) {
    use tokio::io::AsyncWriteExt;
    write_half.write_all(format!("{line}\n").as_bytes()).await.expect("write line");
}

async fn read_json_line(reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>) -> serde_json::Value {
    let mut line = String::new();
    reader.read_line(&mut line).await.expect("read line");
    serde_json::from_str(line.trim()).expect("line should be json")
}

#[tokio::test]
async fn connecting_gets_a_welcome_with_an_assigned_player_id_and_then_lobby_state() {
    let harness = support::ensure_server();
    let (mut reader, mut writer) = connect(harness.game_addr).await;

    let welcome = read_json_line(&mut reader).await;
    assert_eq!(welcome["type"], "welcome");
    let player_id = welcome["player_id"].as_str().expect("player_id").to_string();
    assert!(!player_id.is_empty());

    send_line(&mut writer, &serde_json::json!({"type": "hello", "name": "Arthur"}).to_string()).await;

    // The authority broadcasts lobby_state after every mutation; our own
    // hello should surface our new name in the next line.
    loop {
        let event = read_json_line(&mut reader).await;
        if event["type"] == "lobby_state" {
            let players = event["lobby"]["players"].as_array().expect("players array");
            assert!(players.iter().any(|p| p["player_id"] == player_id && p["name"] == "Arthur"));
            break;
        }
    }
}
