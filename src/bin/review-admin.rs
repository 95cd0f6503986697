//! Command-line moderation board. Talks to the API at `REVIEWS_API_URL`.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use review_moderation::admin::{
    format_review_card, AdminBoard, Confirm, FilterStatus, ReviewFilter,
};
use review_moderation::client::{ClientError, ReviewsClient};
use review_moderation::models::ReviewResponse;
use review_moderation::report::{page_count, render_html, ExportOptions, ReviewReport};

#[derive(Parser, Debug)]
#[command(name = "review-admin")]
#[command(about = "Moderate reviews through the review moderation API")]
struct Cli {
    /// Skip the confirmation prompt before deleting
    #[arg(short = 'y', long, default_value_t = false)]
    yes: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// All reviews, newest first
    List,
    /// Reviews whose author name contains NAME
    SearchUser { name: String },
    /// Reviews published between START and END (YYYY-MM-DD or RFC 3339)
    SearchDates { start: String, end: String },
    /// Delete one review by id
    Delete { id: String },
    /// Delete every review whose author name contains NAME
    DeleteUserReviews { name: String },
    /// Delete every review published between START and END
    DeleteRange { start: String, end: String },
    /// Write the printable HTML report
    Report {
        #[arg(default_value = "review-report.html")]
        out: PathBuf,
    },
}

struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));

    let cli = Cli::parse();
    let client = ReviewsClient::from_env();

    let result = if cli.yes {
        run(AdminBoard::new(client.clone(), AutoConfirm), &client, cli.command).await
    } else {
        run(AdminBoard::new(client.clone(), StdinConfirm), &client, cli.command).await
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Client(e)) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
        Err(CliError::Filter(message)) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
        Err(CliError::Io(e)) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug)]
enum CliError {
    Client(ClientError),
    /// Search failed for a reason other than "no reviews"
    Filter(String),
    Io(io::Error),
}

impl From<ClientError> for CliError {
    fn from(e: ClientError) -> Self {
        CliError::Client(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

async fn run<C: Confirm>(
    mut board: AdminBoard<C>,
    client: &ReviewsClient,
    command: Command,
) -> Result<(), CliError> {
    match command {
        Command::List => {
            board.refresh_feed().await?;
            print_reviews(board.feed());
        }
        Command::SearchUser { name } => {
            search(&mut board, ReviewFilter::Username(name)).await?;
            print_filter(&board);
        }
        Command::SearchDates { start, end } => {
            search(&mut board, ReviewFilter::DateRange { start, end }).await?;
            print_filter(&board);
        }
        Command::Delete { id } => {
            if board.delete_from_feed(&id).await? {
                println!("Review {} deleted", id);
            }
        }
        Command::DeleteUserReviews { name } => {
            search(&mut board, ReviewFilter::Username(name)).await?;
            delete_filtered(&mut board).await?;
        }
        Command::DeleteRange { start, end } => {
            search(&mut board, ReviewFilter::DateRange { start, end }).await?;
            delete_filtered(&mut board).await?;
        }
        Command::Report { out } => write_report(client, &out).await?,
    }

    Ok(())
}

async fn search<C: Confirm>(
    board: &mut AdminBoard<C>,
    filter: ReviewFilter,
) -> Result<(), CliError> {
    match board.search(filter).await {
        FilterStatus::Error(message) => Err(CliError::Filter(message.clone())),
        _ => Ok(()),
    }
}

async fn delete_filtered<C: Confirm>(board: &mut AdminBoard<C>) -> Result<(), CliError> {
    print_filter(board);
    if !matches!(board.status(), FilterStatus::Results) {
        return Ok(());
    }

    if let Some(result) = board.delete_all_filtered().await? {
        println!("{}", result.message);
        if !result.invalid_ids.is_empty() {
            println!("Skipped invalid ids: {}", result.invalid_ids.join(", "));
        }
    }
    Ok(())
}

async fn write_report(client: &ReviewsClient, path: &Path) -> Result<(), CliError> {
    let (counts, low_ratings) =
        futures::try_join!(client.rating_aggregates(), client.low_ratings())?;

    let report = ReviewReport::build(counts, &low_ratings);
    let options = ExportOptions::default();
    std::fs::write(path, render_html(&report, &options))?;

    println!(
        "Report written to {} ({} reviews, {} pages)",
        path.display(),
        report.total,
        page_count(&report, &options)
    );
    Ok(())
}

fn print_filter<C: Confirm>(board: &AdminBoard<C>) {
    match board.status().message() {
        Some(message) => println!("{}", message),
        None => print_reviews(board.filtered()),
    }
}

fn print_reviews(reviews: &[ReviewResponse]) {
    if reviews.is_empty() {
        println!("No reviews available");
        return;
    }
    for review in reviews {
        println!("{}\n", format_review_card(review));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nothing listens on the discard port
    fn unreachable_client() -> ReviewsClient {
        ReviewsClient::new("http://127.0.0.1:9")
    }

    #[test]
    fn test_parse_yes_before_subcommand() {
        let cli = Cli::try_parse_from(["review-admin", "-y", "delete", "abc"]).unwrap();
        assert!(cli.yes);
        assert_eq!(cli.command, Command::Delete { id: "abc".to_string() });
    }

    #[test]
    fn test_positional_named_like_flag_is_kept() {
        let cli = Cli::try_parse_from(["review-admin", "search-user", "--", "-y"]).unwrap();
        assert!(!cli.yes);
        assert_eq!(cli.command, Command::SearchUser { name: "-y".to_string() });
    }

    #[test]
    fn test_report_default_path_and_missing_args() {
        let cli = Cli::try_parse_from(["review-admin", "report"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Report { out: PathBuf::from("review-report.html") }
        );
        assert!(Cli::try_parse_from(["review-admin", "search-dates", "2024-01-01"]).is_err());
        assert!(Cli::try_parse_from(["review-admin"]).is_err());
    }

    #[tokio::test]
    async fn test_search_failure_is_an_error() {
        let client = unreachable_client();
        let board = AdminBoard::new(client.clone(), AutoConfirm);
        let result = run(board, &client, Command::SearchUser { name: "ada".into() }).await;
        match result {
            Err(CliError::Filter(message)) => {
                assert_eq!(message, "Network error. Please try again later.")
            }
            other => panic!("expected a filter error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bulk_delete_after_failed_search_is_an_error() {
        let client = unreachable_client();
        let board = AdminBoard::new(client.clone(), AutoConfirm);
        let command = Command::DeleteUserReviews { name: "ada".into() };
        assert!(matches!(run(board, &client, command).await, Err(CliError::Filter(_))));
    }
}
