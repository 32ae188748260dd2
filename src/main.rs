//! u-shopfloor command line.
//!
//! - `solve`: solve a JSON request from a file or stdin
//! - `replan-demo`: solve a small order book, append an order, re-solve
//! - `sample-request`: print an example request

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use u_shopfloor::formulation::{Formulation, ModelOptions, ObjectivePolicy};
use u_shopfloor::models::{Order, ProblemInstance, ScheduleRequest, ScheduleResponse};
use u_shopfloor::replan::PlanningInstance;
use u_shopfloor::scheduler::ScheduleKpi;
use u_shopfloor::solver::CancellationToken;
use u_shopfloor::validation::validate_request;
use u_shopfloor::{logging, ProductionScheduler, ScheduleError, SchedulerConfig};

/// Shop-floor production scheduler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve a scheduling request
    Solve {
        /// Request JSON file, or `-` for stdin
        #[arg(long)]
        request: PathBuf,

        /// Configuration TOML file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Solve time limit in seconds (overrides the config)
        #[arg(long)]
        time_limit: Option<u64>,
    },
    /// Solve two orders, append a third, and re-solve
    ReplanDemo {
        /// Configuration TOML file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Print an example request
    SampleRequest,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

fn main() -> ExitCode {
    logging::init();
    let args = Args::parse();

    let result = match args.command {
        Command::Solve {
            request,
            config,
            format,
            time_limit,
        } => solve(request, config, format, time_limit),
        Command::ReplanDemo { config, format } => replan_demo(config, format),
        Command::SampleRequest => sample_request(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<SchedulerConfig, ScheduleError> {
    match path {
        Some(path) => Ok(SchedulerConfig::load(path)?),
        None => Ok(SchedulerConfig::default()),
    }
}

fn read_request(path: &Path) -> Result<ScheduleRequest, ScheduleError> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&text)?)
}

fn solve(
    request: PathBuf,
    config: Option<PathBuf>,
    format: OutputFormat,
    time_limit: Option<u64>,
) -> Result<(), ScheduleError> {
    let mut config = load_config(config)?;
    if let Some(seconds) = time_limit {
        config = config.with_time_limit_seconds(seconds);
        config.validate()?;
    }
    let request = read_request(&request)?;
    let instance = validate_request(&request)?;

    let scheduler = ProductionScheduler::new().with_config(config);
    let response = scheduler.solve_instance(&instance, CancellationToken::new());
    print_response(&response, &instance, format)
}

fn replan_demo(config: Option<PathBuf>, format: OutputFormat) -> Result<(), ScheduleError> {
    let config = load_config(config)?.with_model(ModelOptions {
        formulation: Formulation::ContinuousQuantity,
        objective: ObjectivePolicy::WeightedCompletion,
        track_setup_state: true,
    });
    let settings = config.replan.clone();
    let scheduler = ProductionScheduler::new().with_config(config);

    let plan = PlanningInstance::new(
        vec![
            Order::new("A", "Spec1", 50.0).with_deadline(10),
            Order::new("B", "Spec2", 100.0).with_deadline(15),
        ],
        vec!["M1".into(), "M2".into()],
        settings,
    )?;
    info!(event = "replan_demo", step = "initial", orders = plan.orders().len());
    let response = plan.optimize(&scheduler)?;
    print_response(&response, &plan.to_problem()?, format)?;

    let plan = plan.append(Order::new("C", "Spec2", 100.0).with_deadline(20))?;
    info!(event = "replan_demo", step = "appended", orders = plan.orders().len());
    let response = plan.optimize(&scheduler)?;
    print_response(&response, &plan.to_problem()?, format)
}

fn sample_request() -> Result<(), ScheduleError> {
    let request = ScheduleRequest::new(24)
        .with_customer("A")
        .with_customer("B")
        .with_customer("C")
        .with_machine("M1", 7.0)
        .with_machine("M2", 6.5)
        .with_specification("Spec1")
        .with_specification("Spec2")
        .with_demand("A", "Spec1", 50.0)
        .with_demand("B", "Spec2", 100.0)
        .with_demand("C", "Spec2", 100.0)
        .with_cleaning_time(3.0)
        .with_changeover_cost(100.0)
        .with_min_run_time(2);
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

fn print_response(
    response: &ScheduleResponse,
    instance: &ProblemInstance,
    format: OutputFormat,
) -> Result<(), ScheduleError> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(response)?),
        OutputFormat::Table => print_table(response, instance),
    }
    Ok(())
}

fn print_table(response: &ScheduleResponse, instance: &ProblemInstance) {
    println!("status: {:?}", response.status);
    match response.objective_value {
        Some(v) => println!("objective: {v:.2}"),
        None => println!("objective: -"),
    }
    if let Some(message) = &response.message {
        println!("message: {message}");
    }
    println!("computation time: {:.3}s", response.computation_time);

    if !response.plan.entries.is_empty() {
        println!();
        println!(
            "{:<8} {:>4}  {:<10} {:<10} {:>10}",
            "machine", "hour", "customer", "spec", "quantity"
        );
        for e in &response.plan.entries {
            println!(
                "{:<8} {:>4}  {:<10} {:<10} {:>10.2}",
                e.machine, e.hour, e.customer, e.spec, e.quantity
            );
        }
    }

    if !response.plan.changeovers.is_empty() {
        println!();
        println!("{:<8} {:>4}  {:<10} {:<10}", "machine", "hour", "from", "to");
        for c in &response.plan.changeovers {
            println!(
                "{:<8} {:>4}  {:<10} {:<10}",
                c.machine,
                c.hour,
                c.from_spec.as_deref().unwrap_or("-"),
                c.to_spec.as_deref().unwrap_or("-"),
            );
        }
    }

    if response.is_optimal() {
        let kpi = ScheduleKpi::calculate(&response.plan, instance);
        println!();
        println!(
            "production hours: {}  idle hours: {}  changeovers: {}",
            kpi.production_hours, kpi.idle_hours, kpi.changeovers
        );
        println!(
            "avg utilization: {:.1}%  fill rate: {:.1}%  completion hour: {}",
            kpi.avg_utilization * 100.0,
            kpi.fill_rate * 100.0,
            kpi.completion_hour
        );
    }
    println!();
}
