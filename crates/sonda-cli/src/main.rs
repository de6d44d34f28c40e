use std::process;

use chrono::{DateTime, SecondsFormat};
use clap::{Args, Parser, Subcommand};
use sonda_proto::sonda_inspect_client::SondaInspectClient;
use sonda_proto::sonda_publish_client::SondaPublishClient;
use sonda_proto::{
    CloseSessionRequest, FindMessageRequest, ListMessagesRequest, MessageInfo,
    RequeueDeadLetterRequest, ScheduleSendRequest, SendOrderRequest, SendSessionMessageRequest,
    SubQueue,
};
use tonic::transport::Channel;

#[derive(Parser)]
#[command(name = "sonda", about = "Inspect, redrive and publish queue messages")]
struct Cli {
    /// Server address
    #[arg(long, default_value = "http://localhost:5660", global = true)]
    addr: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LookupArgs {
    /// Message id to look for
    #[arg(long = "id")]
    message_id: Option<String>,

    /// Order number to look for (attribute or JSON body)
    #[arg(long = "order")]
    order_number: Option<String>,

    /// Maximum number of messages to scan (0 = server default)
    #[arg(long, default_value = "0")]
    max_to_scan: i64,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the first message matching an id or order number
    Find {
        #[command(flatten)]
        lookup: LookupArgs,

        /// Search the dead-letter sub-queue instead of the active queue
        #[arg(long)]
        dead_letter: bool,
    },

    /// List one page of messages
    List {
        /// List the dead-letter sub-queue
        #[arg(long)]
        dead_letter: bool,

        /// Page size (max 200)
        #[arg(long, default_value = "50")]
        top: i64,

        /// Sequence number to start from
        #[arg(long = "from")]
        from_sequence: Option<u64>,

        /// Body characters to show (0 = no truncation)
        #[arg(long)]
        max_body: Option<i64>,
    },

    /// Copy a dead-lettered message back onto the active queue
    Requeue {
        #[command(flatten)]
        lookup: LookupArgs,
    },

    /// Send an order (inline JSON or @file)
    Send {
        body: String,

        /// Stamp order number, timestamps and envelope fields
        #[arg(long)]
        enriched: bool,

        /// Time-to-live in seconds (enriched only)
        #[arg(long, default_value = "0", requires = "enriched")]
        ttl: i64,

        /// Schedule the order this many seconds ahead (enriched only)
        #[arg(long, default_value = "0", requires = "enriched")]
        schedule_in: i64,
    },

    /// Schedule a message (inline JSON or @file)
    Schedule {
        body: String,

        /// Delay in seconds
        #[arg(long = "in")]
        seconds: i64,
    },

    /// Session queue operations
    #[command(subcommand)]
    Session(SessionCommands),
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Send a message tagged with a session id
    Send {
        session_id: String,

        /// Message body (inline or @file)
        body: String,
    },

    /// Take and release the lock on a session
    Close { session_id: String },
}

struct Clients {
    inspect: SondaInspectClient<Channel>,
    publish: SondaPublishClient<Channel>,
}

async fn connect(addr: &str) -> Clients {
    let endpoint = match Channel::from_shared(addr.to_string()) {
        Ok(endpoint) => endpoint,
        Err(_) => {
            eprintln!("Error: invalid server address {addr}");
            process::exit(1);
        }
    };
    match endpoint.connect().await {
        Ok(channel) => Clients {
            inspect: SondaInspectClient::new(channel.clone()),
            publish: SondaPublishClient::new(channel),
        },
        Err(_) => {
            eprintln!("Error: cannot connect to server at {addr}");
            process::exit(1);
        }
    }
}

fn format_rpc_error(status: tonic::Status) -> String {
    match status.code() {
        tonic::Code::InvalidArgument => format!("Error: {}", status.message()),
        tonic::Code::FailedPrecondition => format!("Error: {}", status.message()),
        tonic::Code::Unavailable if status.message().is_empty() => {
            "Error: server unavailable".to_string()
        }
        tonic::Code::Unavailable => format!("Error: server misconfigured: {}", status.message()),
        _ => format!("Error: {}", status.message()),
    }
}

fn fail(status: tonic::Status) -> ! {
    eprintln!("{}", format_rpc_error(status));
    process::exit(1);
}

/// Inline body, or the contents of a file when prefixed with `@`.
fn read_body(arg: &str) -> String {
    let Some(path) = arg.strip_prefix('@') else {
        return arg.to_string();
    };
    match std::fs::read_to_string(path) {
        Ok(body) => body,
        Err(e) => {
            eprintln!("Error: cannot read {path}: {e}");
            process::exit(1);
        }
    }
}

fn format_ms(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| ms.to_string())
}

fn sub_queue_label(value: i32) -> &'static str {
    match SubQueue::try_from(value) {
        Ok(SubQueue::DeadLetter) => "deadletter",
        _ => "active",
    }
}

fn print_message(m: &MessageInfo) {
    println!("  Sequence:       {}", m.sequence_number);
    println!("  Message id:     {}", m.message_id);
    let optional = [
        ("Correlation id", &m.correlation_id),
        ("Session id", &m.session_id),
        ("Content type", &m.content_type),
        ("Subject", &m.subject),
        ("DLQ reason", &m.dead_letter_reason),
        ("DLQ description", &m.dead_letter_description),
    ];
    for (label, value) in optional {
        if !value.is_empty() {
            println!("  {:<15} {value}", format!("{label}:"));
        }
    }
    println!("  Enqueued:       {}", format_ms(m.enqueued_at_ms));
    let times = [
        ("Locked until", m.locked_until_ms),
        ("Expires", m.expires_at_ms),
        ("Scheduled", m.scheduled_enqueue_at_ms),
    ];
    for (label, ms) in times {
        if ms > 0 {
            println!("  {:<15} {}", format!("{label}:"), format_ms(ms));
        }
    }
    println!("  Deliveries:     {}", m.delivery_count);
    if !m.properties.is_empty() {
        let mut props: Vec<_> = m.properties.iter().collect();
        props.sort();
        println!("  Properties:");
        for (k, v) in props {
            println!("    {k} = {v}");
        }
    }
    println!("  Body:");
    for line in m.body.lines() {
        println!("    {line}");
    }
}

async fn cmd_find(clients: &mut Clients, lookup: LookupArgs, dead_letter: bool) {
    let sub_queue = if dead_letter {
        SubQueue::DeadLetter
    } else {
        SubQueue::Active
    };
    let request = FindMessageRequest {
        message_id: lookup.message_id.unwrap_or_default(),
        order_number: lookup.order_number.unwrap_or_default(),
        sub_queue: sub_queue as i32,
        max_to_scan: lookup.max_to_scan,
    };

    match clients.inspect.find_message(request).await {
        Ok(resp) => {
            let resp = resp.into_inner();
            match resp.message {
                Some(message) if resp.found => {
                    println!("Found in {}:", sub_queue_label(resp.location));
                    print_message(&message);
                }
                _ => println!(
                    "Not found in the first {} messages of {}",
                    resp.max_to_scan,
                    sub_queue_label(resp.location)
                ),
            }
        }
        Err(status) => fail(status),
    }
}

async fn cmd_list(
    clients: &mut Clients,
    dead_letter: bool,
    top: i64,
    from_sequence: Option<u64>,
    max_body: Option<i64>,
) {
    let sub_queue = if dead_letter {
        SubQueue::DeadLetter
    } else {
        SubQueue::Active
    };
    let request = ListMessagesRequest {
        sub_queue: sub_queue as i32,
        top,
        from_sequence,
        max_body,
    };

    match clients.inspect.list_messages(request).await {
        Ok(resp) => {
            let page = resp.into_inner();
            if page.messages.is_empty() {
                println!("No messages in {}.", sub_queue_label(page.sub_queue));
                return;
            }

            let id_width = page
                .messages
                .iter()
                .map(|m| m.message_id.len())
                .max()
                .unwrap_or(2)
                .max(2);
            println!(
                "{:>8}  {:<id_width$}  {:>10}  BODY",
                "SEQ", "ID", "DELIVERIES"
            );
            for m in &page.messages {
                println!(
                    "{:>8}  {:<id_width$}  {:>10}  {}",
                    m.sequence_number,
                    m.message_id,
                    m.delivery_count,
                    m.body.replace('\n', " ")
                );
            }
            if let Some(next) = page.next_sequence_number {
                println!();
                println!("{} message(s); next page: --from {next}", page.count);
            }
        }
        Err(status) => fail(status),
    }
}

async fn cmd_requeue(clients: &mut Clients, lookup: LookupArgs) {
    let request = RequeueDeadLetterRequest {
        message_id: lookup.message_id.unwrap_or_default(),
        order_number: lookup.order_number.unwrap_or_default(),
        max_to_scan: lookup.max_to_scan,
    };

    match clients.inspect.requeue_dead_letter(request).await {
        Ok(resp) => {
            let resp = resp.into_inner();
            if !resp.requeued {
                println!(
                    "No dead-lettered message matched in the first {} messages",
                    resp.max_to_scan
                );
                return;
            }
            println!(
                "Requeued \"{}\" (dead-letter seq {}) as active seq {}",
                resp.message_id, resp.original_sequence, resp.new_sequence
            );
            if !resp.session_id.is_empty() {
                println!("  Session id: {}", resp.session_id);
            }
        }
        Err(status) => fail(status),
    }
}

async fn cmd_send(clients: &mut Clients, body: String, enriched: bool, ttl: i64, schedule_in: i64) {
    let request = SendOrderRequest {
        body: read_body(&body),
        enriched,
        ttl_seconds: ttl,
        schedule_in_seconds: schedule_in,
    };

    match clients.publish.send_order(request).await {
        Ok(resp) => {
            let resp = resp.into_inner();
            if resp.scheduled {
                println!(
                    "Scheduled order \"{}\" (seq {}) for {}",
                    resp.message_id,
                    resp.sequence_number,
                    format_ms(resp.scheduled_enqueue_at_ms)
                );
            } else if resp.message_id.is_empty() {
                println!("Sent order (seq {})", resp.sequence_number);
            } else {
                println!(
                    "Sent order \"{}\" (seq {})",
                    resp.message_id, resp.sequence_number
                );
            }
            if resp.ttl_seconds > 0 {
                println!("  TTL: {}s", resp.ttl_seconds);
            }
        }
        Err(status) => fail(status),
    }
}

async fn cmd_schedule(clients: &mut Clients, body: String, seconds: i64) {
    let request = ScheduleSendRequest {
        body: read_body(&body),
        schedule_in_seconds: seconds,
    };

    match clients.publish.schedule_send(request).await {
        Ok(resp) => {
            let resp = resp.into_inner();
            println!(
                "Scheduled seq {} for {}",
                resp.sequence_number,
                format_ms(resp.scheduled_enqueue_at_ms)
            );
        }
        Err(status) => fail(status),
    }
}

async fn cmd_session(clients: &mut Clients, cmd: SessionCommands) {
    match cmd {
        SessionCommands::Send { session_id, body } => {
            let request = SendSessionMessageRequest {
                session_id,
                body: read_body(&body),
            };
            match clients.publish.send_session_message(request).await {
                Ok(resp) => {
                    let resp = resp.into_inner();
                    println!(
                        "Sent to session \"{}\" (seq {})",
                        resp.session_id, resp.sequence_number
                    );
                }
                Err(status) => fail(status),
            }
        }
        SessionCommands::Close { session_id } => {
            match clients
                .publish
                .close_session(CloseSessionRequest { session_id })
                .await
            {
                Ok(resp) => println!("Closed session \"{}\"", resp.into_inner().session_id),
                Err(status) => fail(status),
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mut clients = connect(&cli.addr).await;

    match cli.command {
        Commands::Find {
            lookup,
            dead_letter,
        } => cmd_find(&mut clients, lookup, dead_letter).await,
        Commands::List {
            dead_letter,
            top,
            from_sequence,
            max_body,
        } => cmd_list(&mut clients, dead_letter, top, from_sequence, max_body).await,
        Commands::Requeue { lookup } => cmd_requeue(&mut clients, lookup).await,
        Commands::Send {
            body,
            enriched,
            ttl,
            schedule_in,
        } => cmd_send(&mut clients, body, enriched, ttl, schedule_in).await,
        Commands::Schedule { body, seconds } => cmd_schedule(&mut clients, body, seconds).await,
        Commands::Session(cmd) => cmd_session(&mut clients, cmd).await,
    }
}
