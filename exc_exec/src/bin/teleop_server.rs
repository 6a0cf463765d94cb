//! # Teleop goal server
//!
//! Executable hosting the teleop executive: binds the teleop goal endpoint
//! and dispatches operator commands to the lower-level subsystems.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{eyre::WrapErr, Report};
use log::{info, LevelFilter};

use exc_lib::clients::TeleopSvcPorts;
use exc_lib::params::ExcExecParams;
use exc_lib::serve::serve;
use exc_lib::teleop::{TeleopExec, TeleopParams};
use msgs_if::{
    net::{zmq, RepServer, SocketTimeouts},
    teleop::TeleopGoal,
};
use util::{logger::logger_init, session::Session};

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let session = Session::new("teleop_server", "sessions")
        .wrap_err("Could not create the teleop server session")?;

    logger_init(LevelFilter::Debug, &session).wrap_err("Could not initialise the logger")?;

    info!("Teleop server");
    info!("Session directory: {:?}", session.session_root);

    let exec_params: ExcExecParams =
        util::params::load("exc_exec.toml").wrap_err("Could not load the exec parameters")?;
    let teleop_params: TeleopParams =
        util::params::load("teleop.toml").wrap_err("Could not load the teleop parameters")?;

    let ctx = zmq::Context::new();

    let ports = TeleopSvcPorts::new(&ctx, &exec_params)
        .wrap_err("Could not connect the teleop ports")?;

    let mut exec =
        TeleopExec::new(teleop_params, ports).wrap_err("Could not build the teleop executive")?;

    let server = RepServer::bind(
        &ctx,
        &exec_params.teleop_goal_endpoint,
        SocketTimeouts {
            recv_ms: 100,
            send_ms: 100,
        },
    )
    .wrap_err("Could not bind the teleop goal endpoint")?;

    info!("Teleop server: online");

    serve(server, move |goal: TeleopGoal, preempt| {
        exec.process(goal, preempt)
    })
}
