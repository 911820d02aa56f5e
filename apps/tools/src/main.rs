//! A stand-in controller for exercising `switch-ui` without the real switch.

use std::{
    net::SocketAddr,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use shared::{
    domain::{
        ClientRole, CompositeMode, MarkerRect, Port, ServeMode, StreamKind, DEFAULT_AUDIO_INPUT_PORT,
        DEFAULT_CONTROLLER_PORT, DEFAULT_VIDEO_INPUT_PORT,
    },
    error::{ControllerError, ErrorCode},
    protocol::{encode_line, ClientRequest, ControllerEvent, HandshakeReply},
};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    time::{interval, sleep, timeout},
};
use tracing::{info, warn};

const HELLO_TIMEOUT: Duration = Duration::from_secs(5);
const MARKER_INTERVAL: Duration = Duration::from_secs(1);

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Parser, Debug, Clone)]
#[command(name = "switch-mock-controller", version)]
struct Cli {
    #[arg(long, default_value_t = default_listen())]
    listen: SocketAddr,
    /// Roles allowed to connect; repeat or comma-separate.
    #[arg(long = "accept-role", value_delimiter = ',', default_value = "UI", value_parser = parse_role)]
    accept_role: Vec<ClientRole>,
    /// Close each connection this many seconds after the handshake.
    #[arg(long = "close-after", value_name = "SECS")]
    close_after: Option<u64>,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], DEFAULT_CONTROLLER_PORT.0))
}

fn parse_role(raw: &str) -> Result<ClientRole, String> {
    ClientRole::parse(raw).ok_or_else(|| format!("unknown role '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();
    let listener = TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    info!(listen = %cli.listen, roles = ?cli.accept_role, "mock controller listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let cli = cli.clone();
        tokio::spawn(async move {
            if let Err(error) = serve_client(stream, peer, &cli).await {
                warn!(%peer, error = %format!("{error:#}"), "client session ended with error");
            }
        });
    }
}

async fn serve_client(stream: TcpStream, peer: SocketAddr, cli: &Cli) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let hello = timeout(HELLO_TIMEOUT, lines.next_line())
        .await
        .context("client sent no hello")??
        .context("client hung up before hello")?;
    let role = match serde_json::from_str::<ClientRequest>(&hello)
        .with_context(|| format!("malformed hello: {hello}"))?
    {
        ClientRequest::Hello { role } => role,
        other => anyhow::bail!("expected hello, got {other:?}"),
    };

    if !cli.accept_role.contains(&role) {
        info!(%peer, %role, "rejecting client");
        let reply = HandshakeReply::Rejected {
            error: ControllerError::new(
                ErrorCode::RoleRejected,
                format!("role {role} is not served here"),
            ),
        };
        write_half.write_all(encode_line(&reply)?.as_bytes()).await?;
        return Ok(());
    }

    let client_id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
    info!(%peer, %role, client_id, "client connected");
    write_half
        .write_all(encode_line(&HandshakeReply::Welcome { client_id })?.as_bytes())
        .await?;

    for event in opening_events() {
        write_half.write_all(encode_line(&event)?.as_bytes()).await?;
    }

    let deadline = async {
        match cli.close_after {
            Some(secs) => sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut ticker = interval(MARKER_INTERVAL);
    let mut tick: i32 = 0;
    loop {
        tokio::select! {
            _ = &mut deadline => {
                info!(%peer, client_id, "closing client after scripted delay");
                return Ok(());
            }
            line = lines.next_line() => match line? {
                Some(line) => {
                    if let Some(reply) = answer_request(&line) {
                        write_half.write_all(encode_line(&reply)?.as_bytes()).await?;
                    } else {
                        info!(%peer, client_id, line = %line, "ignoring client message");
                    }
                }
                None => {
                    info!(%peer, client_id, "client disconnected");
                    return Ok(());
                }
            },
            _ = ticker.tick() => {
                for event in marker_events(tick) {
                    write_half.write_all(encode_line(&event)?.as_bytes()).await?;
                }
                tick = tick.wrapping_add(1);
            }
        }
    }
}

/// Composition changes are applied at once and echoed back to the requester.
fn answer_request(line: &str) -> Option<ControllerEvent> {
    match serde_json::from_str::<ClientRequest>(line).ok()? {
        ClientRequest::SetCompositeMode { mode } => {
            info!(mode = mode.number(), "switching composition mode");
            Some(ControllerEvent::CompositeModeSet { mode })
        }
        ClientRequest::Hello { .. } => None,
    }
}

fn opening_events() -> Vec<ControllerEvent> {
    vec![
        ControllerEvent::CompositeModeSet {
            mode: CompositeMode::PictureInPicture,
        },
        ControllerEvent::ComposePortSet {
            port: Port(DEFAULT_VIDEO_INPUT_PORT.0 + 1),
        },
        ControllerEvent::AudioPortSet {
            port: Port(DEFAULT_AUDIO_INPUT_PORT.0 + 1),
        },
        ControllerEvent::PreviewPortAdded {
            port: Port(DEFAULT_VIDEO_INPUT_PORT.0 + 2),
            serve: ServeMode::Video,
            kind: StreamKind::Preview,
        },
        ControllerEvent::PreviewPortAdded {
            port: Port(DEFAULT_AUDIO_INPUT_PORT.0 + 2),
            serve: ServeMode::Audio,
            kind: StreamKind::Audio,
        },
    ]
}

/// One face and one tracking box drifting across the frame.
fn marker_events(tick: i32) -> Vec<ControllerEvent> {
    let offset = (tick % 20) * 16;
    let face = MarkerRect {
        x: 320 + offset,
        y: 180,
        width: 96,
        height: 96,
    };
    let tracking = MarkerRect {
        x: face.x - 32,
        y: face.y - 32,
        width: face.width + 64,
        height: face.height + 64,
    };
    vec![
        ControllerEvent::FaceMarkersUpdated { faces: vec![face] },
        ControllerEvent::TrackMarkersUpdated {
            tracking: vec![tracking],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_role_list_is_parsed() {
        let cli = Cli::try_parse_from([
            "switch-mock-controller",
            "--accept-role",
            "ui,capture",
            "--close-after",
            "3",
        ])
        .expect("args");
        assert_eq!(cli.accept_role, vec![ClientRole::Ui, ClientRole::Capture]);
        assert_eq!(cli.close_after, Some(3));
        assert_eq!(cli.listen, default_listen());
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Cli::try_parse_from(["switch-mock-controller", "--accept-role", "viewer"]).is_err());
    }

    #[test]
    fn opening_script_announces_ports_in_order() {
        let events = opening_events();
        assert_eq!(
            events[0],
            ControllerEvent::CompositeModeSet {
                mode: CompositeMode::PictureInPicture
            }
        );
        assert_eq!(
            events[1],
            ControllerEvent::ComposePortSet { port: Port(3001) }
        );
        assert_eq!(events[2], ControllerEvent::AudioPortSet { port: Port(4001) });
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn composite_mode_request_is_echoed() {
        let line = encode_line(&ClientRequest::SetCompositeMode {
            mode: CompositeMode::DualEqual,
        })
        .expect("encode");
        assert_eq!(
            answer_request(line.trim_end()),
            Some(ControllerEvent::CompositeModeSet {
                mode: CompositeMode::DualEqual
            })
        );
        assert_eq!(answer_request("{\"type\":\"ping\"}"), None);
    }

    #[tokio::test]
    async fn rejected_role_gets_a_rejection_line() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let cli = Cli {
            listen: addr,
            accept_role: vec![ClientRole::Ui],
            close_after: Some(0),
        };
        let server = tokio::spawn(async move {
            let (stream, peer) = listener.accept().await.expect("accept");
            serve_client(stream, peer, &cli).await
        });

        let stream = TcpStream::connect(addr).await.expect("connect");
        let (read_half, mut write_half) = stream.into_split();
        let hello = encode_line(&ClientRequest::Hello {
            role: ClientRole::Capture,
        })
        .expect("encode");
        write_half.write_all(hello.as_bytes()).await.expect("write");

        let mut lines = BufReader::new(read_half).lines();
        let reply: HandshakeReply =
            serde_json::from_str(&lines.next_line().await.expect("read").expect("line"))
                .expect("reply");
        assert!(matches!(
            reply,
            HandshakeReply::Rejected { error } if error.code == ErrorCode::RoleRejected
        ));
        server.await.expect("join").expect("serve");
    }
}
