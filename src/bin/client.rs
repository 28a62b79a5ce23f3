//! RAX File Share - interactive client
//!
//! Reads commands from stdin and prints the server's responses.

use clap::Parser;
use log::error;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use rax_file_share::auth::User;
use rax_file_share::error::ProtocolError;
use rax_file_share::protocol::Response;
use rax_file_share::protocol::responses::{LIST_OK, WRITE_READY};
use rax_file_share::remote::RemoteSession;

/// Ends a multi-line write payload
const END_OF_CONTENT: &str = ".";

#[derive(Parser, Debug)]
#[command(name = "rax-share-client", about = "Connect to a RAX file share server")]
struct Args {
    /// Server address
    #[arg(long, default_value = "127.0.0.1:2121")]
    addr: String,

    /// User name to assert
    #[arg(long)]
    name: Option<String>,

    /// Group to assert
    #[arg(long)]
    group: Option<String>,
}

type Input = Lines<BufReader<Stdin>>;

fn prompt(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

async fn ask(input: &mut Input, question: &str) -> Option<String> {
    prompt(question);
    input.next_line().await.ok().flatten().map(|l| l.trim().to_string())
}

fn print_response(response: &Response) {
    println!("[Server ]: {}", response.status);
    if !response.content.is_empty() {
        println!("[Content]:\n{}", response.content);
    }
    println!();
}

fn print_help() {
    println!("\nHere are the commands:");
    println!("=====================================================================================");
    println!(" exit:\t\t\t\t\tclose the connection.");
    println!(" create [filename] [permissions]:\tcreate a file. (permissions ex: r-rw--).");
    println!(" mode   [filename] [permissions]:\tchange the permission of the file.");
    println!(" write  [filename] [mode]:\t\twrite a file. mode o/a means overwrite/append.");
    println!(" read   [filename]:\t\t\tget the content of the file.");
    println!(" ls:  \t\t\t\t\tlist all the files that can be read/written.");
    println!("=====================================================================================\n");
}

async fn run_list(session: &mut RemoteSession) -> Result<(), ProtocolError> {
    let (response, entries) = session.list().await?;
    if !response.is(LIST_OK) {
        print_response(&response);
        return Ok(());
    }
    println!("{:<15}\t{}", "Filename", "Permission");
    println!("===============================");
    for (filename, permissions) in entries {
        println!("{filename:<15}\t{permissions}");
    }
    println!();
    Ok(())
}

async fn run_write(
    session: &mut RemoteSession,
    input: &mut Input,
    filename: &str,
    mode: &str,
) -> Result<(), ProtocolError> {
    if mode != "o" && mode != "a" {
        println!("[Client ]: write mode must be o (overwrite) or a (append)\n");
        return Ok(());
    }

    let ready = session.begin_write(filename, mode).await?;
    print_response(&ready);
    if !ready.is(WRITE_READY) {
        return Ok(());
    }

    println!("Enter the content to write.\n(Finish with a line containing only `{END_OF_CONTENT}`):\n");
    let mut lines = Vec::new();
    while let Ok(Some(line)) = input.next_line().await {
        if line == END_OF_CONTENT {
            break;
        }
        lines.push(line);
    }

    let response = session.send_content(lines.join("\n").as_bytes()).await?;
    print_response(&response);
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args = Args::parse();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let name = match args.name {
        Some(name) => name,
        None => ask(&mut input, "Please input your name: ").await.unwrap_or_default(),
    };
    let group = match args.group {
        Some(group) => group,
        None => ask(&mut input, "Please input your group: ").await.unwrap_or_default(),
    };
    let user = User::new(name, group);

    let mut session = match RemoteSession::connect(&args.addr, user).await {
        Ok(session) => session,
        Err(e) => {
            error!("Connection to {} failed: {}", args.addr, e);
            std::process::exit(1);
        }
    };
    println!("Connected to server at {}", args.addr);

    loop {
        prompt(&format!("{} > ", session.user().name));
        let line = match input.next_line().await {
            Ok(Some(line)) => line,
            _ => {
                println!("Error reading input. Exiting.");
                break;
            }
        };
        let command = line.trim();
        let words: Vec<&str> = command.split_whitespace().collect();

        let outcome = match words.as_slice() {
            [] => continue,
            ["exit"] => {
                println!("Closing connection...");
                break;
            }
            ["help"] => {
                print_help();
                Ok(())
            }
            ["ls"] => run_list(&mut session).await,
            ["write", filename, mode] => run_write(&mut session, &mut input, filename, mode).await,
            _ => session.request(command).await.map(|r| print_response(&r)),
        };

        if let Err(e) = outcome {
            println!("Disconnected from server: {e}");
            break;
        }
    }

    println!("Connection closed.");
}
