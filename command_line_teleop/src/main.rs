//! # Command line teleop client
//!
//! Interactive shell for issuing teleop commands to the excavation executive.
//! Each line is either a teleop command name, which is sent as a new goal, or
//! one of the shell's own verbs:
//!
//! - `status` polls the state of the current goal
//! - `cancel` requests preemption of the current goal
//! - `quit` / `exit` leaves the shell
//!
//! Goal submission is non-blocking: the server accepts the goal and the
//! operator polls `status` for the outcome, so `cancel` can always get
//! through while a long command runs.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{eyre::WrapErr, Report};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use structopt::StructOpt;

use msgs_if::{
    net::{zmq, ServiceClient, SocketTimeouts},
    svc::{GoalOutcome, TaskRequest, TaskResponse},
    teleop::{TeleopCode, TeleopGoal},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const PROMPT: &str = "teleop $ ";
const HISTORY_PATH: &str = "data/teleop_history.txt";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "command_line_teleop", about = "Teleop command shell")]
struct Opt {
    /// Endpoint of the teleop goal server
    #[structopt(long, default_value = "tcp://localhost:5030")]
    endpoint: String,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    let ctx = zmq::Context::new();
    let client = ServiceClient::connect(&ctx, &opt.endpoint, SocketTimeouts::default())
        .wrap_err("Could not connect to the teleop goal server")?;

    println!("Connected to {}", opt.endpoint);
    println!("Enter a command name, \"status\", \"cancel\", or \"quit\"");

    let mut rl = new_editor().wrap_err("Could not create the line editor")?;

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match line {
                    "quit" | "exit" => break,
                    "status" => request(&client, &TaskRequest::<TeleopGoal>::Status),
                    "cancel" => request(&client, &TaskRequest::<TeleopGoal>::Cancel),
                    _ => submit(&client, line),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                println!("Unhandled error: {:?}", e);
                break;
            }
        }
    }

    if let Err(e) = rl.save_history(HISTORY_PATH) {
        println!("Could not save the history: {}", e);
    }

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create the line editor, loading any previous history.
fn new_editor() -> RlResult<DefaultEditor> {
    let mut rl = DefaultEditor::new()?;
    if rl.load_history(HISTORY_PATH).is_err() {
        println!("No history detected");
    }
    Ok(rl)
}

/// Parse the line as a teleop command and submit it as a new goal.
fn submit(client: &ServiceClient, line: &str) {
    // Prepend a binary name so the parser sees the command as a subcommand
    let words = std::iter::once("teleop").chain(line.split_whitespace());

    let code = match TeleopCode::from_iter_safe(words) {
        Ok(code) => code,
        Err(e) => {
            println!("{}", e.message);
            return;
        }
    };

    request(client, &TaskRequest::Start(TeleopGoal::new(code)));
}

/// Send one request to the goal server and print the response.
fn request(client: &ServiceClient, req: &TaskRequest<TeleopGoal>) {
    match client.call::<_, TaskResponse<GoalOutcome>>(req) {
        Ok(response) => println!("{:?}", response),
        Err(e) => println!("Request failed: {}", e),
    }
}
