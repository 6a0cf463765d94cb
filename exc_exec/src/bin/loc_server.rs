//! # Localization goal server
//!
//! Executable hosting the localization coordinator: binds the localization
//! goal endpoint and runs marker-based pose acquisition on demand. Each
//! committed point is also archived into the session for post-run analysis.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn, LevelFilter};

use exc_lib::clients::LocSvcPorts;
use exc_lib::loc::{LocOutcome, LocParams, Localizer};
use exc_lib::params::ExcExecParams;
use exc_lib::serve::serve;
use msgs_if::{
    net::{zmq, RepServer, SocketTimeouts},
    svc::{GoalOutcome, LocalizeGoal},
};
use util::{logger::logger_init, session::Session};

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let session = Session::new("loc_server", "sessions")
        .wrap_err("Could not create the localization server session")?;

    logger_init(LevelFilter::Debug, &session).wrap_err("Could not initialise the logger")?;

    info!("Localization server");
    info!("Session directory: {:?}", session.session_root);

    let exec_params: ExcExecParams =
        util::params::load("exc_exec.toml").wrap_err("Could not load the exec parameters")?;
    let loc_params: LocParams =
        util::params::load("loc.toml").wrap_err("Could not load the localization parameters")?;

    let ctx = zmq::Context::new();

    let ports = LocSvcPorts::new(&ctx, &exec_params)
        .wrap_err("Could not connect the localization ports")?;

    let mut localizer = Localizer::new(loc_params, ports)
        .wrap_err("Could not build the localization coordinator")?;

    let server = RepServer::bind(
        &ctx,
        &exec_params.loc_goal_endpoint,
        SocketTimeouts {
            recv_ms: 100,
            send_ms: 100,
        },
    )
    .wrap_err("Could not bind the localization goal endpoint")?;

    info!("Localization server: online");

    let archive_session = session;

    serve(server, move |_goal: LocalizeGoal, preempt| {
        match localizer.localize(preempt) {
            LocOutcome::Succeeded(point) => {
                let archive_path = format!(
                    "loc_points/point_{}.json",
                    point.stamp.format("%Y%m%d_%H%M%S")
                );
                if let Err(e) = archive_session.save(&archive_path, &point) {
                    warn!("Could not archive the localized point: {}", e);
                }
                GoalOutcome::Succeeded
            }
            LocOutcome::Preempted => GoalOutcome::Preempted,
        }
    })
}
