use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::TcpStream;

use crate::client::ClientSession;
use crate::error::ErrorKind;
use crate::protocol::{
    CommandStatus, Request, Response, handle_command, parse_command, read_message, write_message,
};
use crate::server::ServerContext;

/// Serves one client connection until it disconnects.
///
/// - Reads one JSON request per line with a bounded `BufReader`.
/// - Binds the session identity on the first request.
/// - Dispatches commands with `handle_command`, which may use the connection
///   again for the write sub-protocol.
pub async fn handle_client(cmd_stream: TcpStream, client_addr: SocketAddr, ctx: Arc<ServerContext>) {
    let (read_half, mut write_half) = cmd_stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut session = ClientSession::new(client_addr);
    let max_request_length = ctx.config.max_request_length;

    loop {
        let request: Request = match read_message(&mut reader, max_request_length).await {
            Ok(Some(request)) => request,
            Ok(None) => {
                // Client closed the connection
                info!("Connection closed by client {}", client_addr);
                break;
            }
            Err(e) if e.is_recoverable() => {
                warn!("Rejected request from {}: {}", client_addr, e);
                let response = Response::failure(ErrorKind::InvalidCommand);
                if write_message(&mut write_half, &response).await.is_err() {
                    break;
                }
                continue;
            }
            Err(e) => {
                error!("Failed to read from {}: {}", client_addr, e);
                break;
            }
        };

        if let Err(e) = session.bind_identity(&request.user, ctx.config.max_identity_length) {
            warn!("Client {}: {}", client_addr, e);
            if write_message(&mut write_half, &Response::failure(e.kind()))
                .await
                .is_err()
            {
                break;
            }
            continue;
        }

        let command = parse_command(&request.command);
        info!("Received from {} ({}): {:?}", client_addr, request.user, command);

        let result = handle_command(&ctx, &request.user, &command, &mut reader, &mut write_half).await;
        session.record_command();

        if let Some(response) = &result.response {
            info!(
                "Sending response to client {}: {}",
                client_addr, response.status
            );
            if let Err(e) = write_message(&mut write_half, response).await {
                error!("Failed to send response to {}: {}", client_addr, e);
                break;
            }
        }

        if result.status == CommandStatus::CloseConnection {
            info!("Dropping client {} after an interrupted transfer", client_addr);
            break;
        }
    }

    info!(
        "Client {} disconnected after {} commands",
        session.client_addr(),
        session.commands_handled()
    );
}
