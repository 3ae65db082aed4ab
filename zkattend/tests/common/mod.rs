//! A scripted ZKTeco terminal served over a local TCP listener.

#![allow(dead_code)]

use std::sync::Arc;

use bytes::{Buf, BytesMut};
use chrono::NaiveDateTime;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use zkattend_core::{Command, FrameHeader, Packet};
use zkattend_types::time;

pub const SESSION_ID: u16 = 0x1234;

/// One punch held by the fake terminal
#[derive(Debug, Clone)]
pub struct StoredPunch {
    pub uid: u16,
    pub user_id: String,
    pub at: NaiveDateTime,
    pub status: u8,
    pub punch: u8,
}

/// What the fake terminal holds and what it was told
#[derive(Debug, Default)]
pub struct TerminalState {
    pub users: Vec<(u16, String, String)>,
    pub punches: Vec<StoredPunch>,
    pub clock: Option<NaiveDateTime>,
    pub commkey: Option<u32>,
    pub enabled: bool,
    pub log: Vec<Command>,
}

pub struct FakeTerminal {
    pub port: u16,
    pub state: Arc<Mutex<TerminalState>>,
}

impl FakeTerminal {
    pub async fn start(state: TerminalState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(TerminalState {
            enabled: true,
            ..state
        }));

        let shared = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let shared = shared.clone();
                tokio::spawn(async move { serve(stream, shared).await });
            }
        });

        Self { port, state }
    }
}

async fn read_packet(stream: &mut TcpStream) -> Option<Packet> {
    let mut header = [0u8; FrameHeader::SIZE];
    stream.read_exact(&mut header).await.ok()?;
    let frame = FrameHeader::parse(&header).ok()?;
    let mut body = BytesMut::zeroed(frame.length);
    stream.read_exact(&mut body).await.ok()?;
    Packet::decode(body).ok()
}

async fn write_packet(stream: &mut TcpStream, command: Command, reply_id: u16, payload: Vec<u8>) {
    let packet = Packet::with_payload(command, SESSION_ID, reply_id, payload);
    let framed = FrameHeader::wrap(&packet.encode());
    stream.write_all(&framed).await.unwrap();
}

fn users_buffer(users: &[(u16, String, String)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (uid, user_id, name) in users {
        body.extend_from_slice(&uid.to_le_bytes());
        body.push(0);
        body.extend_from_slice(&[0u8; 8]);
        let mut n = [0u8; 24];
        n[..name.len()].copy_from_slice(name.as_bytes());
        body.extend_from_slice(&n);
        body.extend_from_slice(&0u32.to_le_bytes());
        body.push(0);
        body.extend_from_slice(&[0u8; 7]);
        body.push(0);
        let mut id = [0u8; 24];
        id[..user_id.len()].copy_from_slice(user_id.as_bytes());
        body.extend_from_slice(&id);
    }
    prefixed(body)
}

fn punches_buffer(punches: &[StoredPunch]) -> Vec<u8> {
    let mut body = Vec::new();
    for p in punches {
        body.extend_from_slice(&p.uid.to_le_bytes());
        let mut id = [0u8; 24];
        id[..p.user_id.len()].copy_from_slice(p.user_id.as_bytes());
        body.extend_from_slice(&id);
        body.push(p.status);
        body.extend_from_slice(&time::encode(&p.at).to_le_bytes());
        body.push(p.punch);
        body.extend_from_slice(&[0u8; 8]);
    }
    prefixed(body)
}

fn prefixed(body: Vec<u8>) -> Vec<u8> {
    let mut data = (body.len() as u32).to_le_bytes().to_vec();
    data.extend(body);
    data
}

fn capacity_block(users: usize, records: usize) -> Vec<u8> {
    let mut fields = [0i32; 20];
    fields[4] = users as i32;
    fields[8] = records as i32;
    fields[15] = 3000;
    fields[16] = 100_000;
    fields.iter().flat_map(|f| f.to_le_bytes()).collect()
}

async fn serve(mut stream: TcpStream, state: Arc<Mutex<TerminalState>>) {
    // Buffer staged by CMD_PREPARE_BUFFER for chunked reads
    let mut staged: Vec<u8> = Vec::new();

    while let Some(request) = read_packet(&mut stream).await {
        let reply_id = request.reply_id;
        let mut st = state.lock().await;
        st.log.push(request.command);

        match request.command {
            Command::Connect => {
                let command = if st.commkey.is_some() {
                    Command::AckUnauth
                } else {
                    Command::AckOk
                };
                write_packet(&mut stream, command, reply_id, vec![]).await;
            }
            Command::Auth => {
                let expected = zkattend_core::make_commkey(st.commkey.unwrap_or(0), SESSION_ID, 50);
                let command = if request.payload == expected {
                    Command::AckOk
                } else {
                    Command::AckUnauth
                };
                write_packet(&mut stream, command, reply_id, vec![]).await;
            }
            Command::DisableDevice => {
                st.enabled = false;
                write_packet(&mut stream, Command::AckOk, reply_id, vec![]).await;
            }
            Command::EnableDevice => {
                st.enabled = true;
                write_packet(&mut stream, Command::AckOk, reply_id, vec![]).await;
            }
            Command::GetFreeSizes => {
                let block = capacity_block(st.users.len(), st.punches.len());
                write_packet(&mut stream, Command::AckOk, reply_id, block).await;
            }
            Command::GetVersion => {
                write_packet(&mut stream, Command::AckOk, reply_id, b"Ver 6.60 Apr 2020\0".to_vec())
                    .await;
            }
            Command::OptionsRrq => {
                let key = String::from_utf8_lossy(&request.payload)
                    .trim_end_matches('\0')
                    .to_string();
                let reply = match key.as_str() {
                    "~SerialNumber" => "~SerialNumber=FAKE0001\0".to_string(),
                    other => format!("{}=\0", other),
                };
                write_packet(&mut stream, Command::AckOk, reply_id, reply.into_bytes()).await;
            }
            Command::PrepareBuffer => {
                let mut payload = request.payload.clone();
                payload.advance(1);
                let target = payload.get_u16_le();
                if target == u16::from(Command::UserTempRrq) {
                    // Small directory comes back inline
                    let data = users_buffer(&st.users);
                    write_packet(&mut stream, Command::Data, reply_id, data).await;
                } else {
                    // Log is staged and pulled in chunks
                    staged = punches_buffer(&st.punches);
                    let mut reply = vec![0u8];
                    reply.extend_from_slice(&(staged.len() as u32).to_le_bytes());
                    write_packet(&mut stream, Command::AckOk, reply_id, reply).await;
                }
            }
            Command::ReadBuffer => {
                let mut payload = request.payload.clone();
                let start = payload.get_u32_le() as usize;
                let len = payload.get_u32_le() as usize;
                let chunk = staged[start..start + len].to_vec();

                write_packet(
                    &mut stream,
                    Command::PrepareData,
                    reply_id,
                    (len as u32).to_le_bytes().to_vec(),
                )
                .await;
                for part in chunk.chunks(1024) {
                    write_packet(&mut stream, Command::Data, reply_id, part.to_vec()).await;
                }
                write_packet(&mut stream, Command::AckOk, reply_id, vec![]).await;
            }
            Command::FreeData => {
                staged.clear();
                write_packet(&mut stream, Command::AckOk, reply_id, vec![]).await;
            }
            Command::GetTime => {
                let now = st.clock.map(|c| time::encode(&c)).unwrap_or(0);
                write_packet(&mut stream, Command::AckOk, reply_id, now.to_le_bytes().to_vec())
                    .await;
            }
            Command::SetTime => {
                let mut payload = request.payload.clone();
                st.clock = time::decode(payload.get_u32_le()).ok();
                write_packet(&mut stream, Command::AckOk, reply_id, vec![]).await;
            }
            Command::ClearAttLog => {
                st.punches.clear();
                write_packet(&mut stream, Command::AckOk, reply_id, vec![]).await;
            }
            Command::Restart | Command::Exit => {
                write_packet(&mut stream, Command::AckOk, reply_id, vec![]).await;
                return;
            }
            _ => {
                write_packet(&mut stream, Command::AckUnknown, reply_id, vec![]).await;
            }
        }
    }
}
