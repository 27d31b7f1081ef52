// src/main.rs

use cbt_admin::api::HttpSync;
use cbt_admin::assignment::CohortInput;
use cbt_admin::config::Config;
use cbt_admin::error::AdminError;
use cbt_admin::models::assessment::RunState;
use cbt_admin::view::DetailView;
use dotenvy::dotenv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "\
Usage: cbt-admin <command> [args]

Commands:
  show <assessment-id>                      print assessment state
  authorize <assessment-id>                 toggle the exam clock authorization
  end <assessment-id> [reason]              terminally end an ongoing run
  assign <assessment-id> <level> [group] [sub-group] [--department-only]
  assign-student <assessment-id> <reg-number>
  export <assessment-id> <out-file>         download prepared results
";

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let sync = HttpSync::new(&config).expect("failed to build HTTP client");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = run(&sync, &args).await;

    if let Err(err) = result {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run(sync: &HttpSync, args: &[String]) -> Result<(), AdminError> {
    let command = args.first().map(String::as_str).unwrap_or("help");

    match command {
        "show" => {
            let id = required(args, 1, "assessment id")?;
            let view = load_view(sync, id).await?;
            print_assessment(&view);
            Ok(())
        }
        "authorize" => {
            let id = required(args, 1, "assessment id")?;
            let mut view = load_view(sync, id).await?;
            view.authorize(sync).await?;
            print_assessment(&view);
            Ok(())
        }
        "end" => {
            let id = required(args, 1, "assessment id")?;
            let reason = args.get(2).map(String::as_str);
            let mut view = load_view(sync, id).await?;
            view.end(sync, reason).await?;
            print_assessment(&view);
            Ok(())
        }
        "assign" => {
            let id = required(args, 1, "assessment id")?;
            let level = required(args, 2, "level")?;

            let department_only = args.iter().any(|a| a == "--department-only");
            let positional: Vec<&String> =
                args[3..].iter().filter(|a| !a.starts_with("--")).collect();

            let input = CohortInput {
                level: Some(level.to_string()),
                group: positional.first().map(|s| s.to_string()),
                sub_group: positional.get(1).map(|s| s.to_string()),
                department_only,
            };

            let mut view = load_view(sync, id).await?;
            view.assign_cohort(sync, &input).await?;
            tracing::info!("cohort assigned");
            Ok(())
        }
        "assign-student" => {
            let id = required(args, 1, "assessment id")?;
            let reg_number = required(args, 2, "registration number")?;

            let mut view = load_view(sync, id).await?;
            let student = view.assign_by_reg_number(sync, reg_number).await?;
            tracing::info!("assigned {} ({})", student.full_name, student.reg_number);
            Ok(())
        }
        "export" => {
            let id = required(args, 1, "assessment id")?;
            let out_file = required(args, 2, "output file")?;

            let mut view = load_view(sync, id).await?;
            let bytes = view.export_results(sync).await?;
            std::fs::write(out_file, &bytes)
                .map_err(|e| AdminError::Transport(e.to_string()))?;
            tracing::info!("wrote {} bytes to {}", bytes.len(), out_file);
            Ok(())
        }
        _ => {
            println!("{}", USAGE);
            Ok(())
        }
    }
}

async fn load_view(sync: &HttpSync, id: &str) -> Result<DetailView, AdminError> {
    let mut view = DetailView::new();
    view.load(sync, id).await?;
    Ok(view)
}

fn required<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str, AdminError> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| AdminError::Validation(format!("missing argument: {}", name)))
}

fn print_assessment(view: &DetailView) {
    let Some(assessment) = &view.assessment else {
        return;
    };

    if let Some(course) = &assessment.course {
        println!("{} - {}", course.code, course.title);
    }
    println!("Title:      {}", assessment.title);
    println!("Status:     {}", assessment.status.as_str());
    println!(
        "Run state:  {}",
        match assessment.run_state() {
            RunState::NotStarted => "not started",
            RunState::Ongoing => "ongoing",
            RunState::Ended => "ended",
        }
    );
    if let Some(reason) = &assessment.end_reason {
        println!("End reason: {}", reason);
    }
    println!("Questions:  {}", assessment.question_count());
    if let Some(minutes) = assessment.time_limit {
        println!("Time limit: {} min", minutes);
    }
    if let Some(marks) = assessment.total_marks {
        println!("Marks:      {}", marks);
    }
    println!("Assigned:   {} students", assessment.students.len());
}
