use clap::Parser as _;
use deckparse::utils::error::{DeckError, ErrorSeverity};
use deckparse::utils::{logger, validation::Validate};
use deckparse::{CliConfig, DeckEngine, DeckWriter, Parser, RunSettings};
use std::sync::Arc;

fn exit_code(error: &DeckError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report(error: &DeckError, context: &str) {
    tracing::error!(
        context,
        error = %error,
        category = ?error.category(),
        severity = ?error.severity(),
        "Failed"
    );
    eprintln!("{}: {}", context, error.user_friendly_message());
    eprintln!("Suggestion: {}", error.recovery_suggestion());
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!(config = ?cli, "Starting deckparse");

    let settings = match RunSettings::from_cli(&cli).and_then(|settings| {
        settings.validate()?;
        Ok(settings)
    }) {
        Ok(settings) => settings,
        Err(e) => {
            report(&e, "configuration");
            std::process::exit(exit_code(&e).max(1));
        }
    };

    let registry = match settings.build_registry() {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            report(&e, "keyword schemas");
            std::process::exit(exit_code(&e).max(1));
        }
    };
    tracing::debug!(keywords = registry.len(), "Schema registry ready");

    let parser = Parser::new(Arc::clone(&registry), settings.options);
    let engine = DeckEngine::new_with_monitoring(
        parser,
        settings.output_params(),
        settings.failure_policy,
        settings.monitor,
    );

    let mut worst = 0;
    for (path, result) in engine.parse(settings.decks.clone()).await {
        let label = path.display().to_string();
        let deck = match result {
            Ok(deck) => deck,
            Err(e) => {
                report(&e, &label);
                worst = worst.max(exit_code(&e));
                continue;
            }
        };

        if settings.dump_json {
            match serde_json::to_string_pretty(deck.as_ref()) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    let e = DeckError::from(e);
                    report(&e, &label);
                    worst = worst.max(exit_code(&e));
                }
            }
        }
        if settings.normalize {
            print!("{}", DeckWriter::new(&registry).write(&deck));
        }

        let case = deckparse::core::engine::case_name(&path);
        match engine.write_outputs(Arc::clone(&deck), &case).await {
            Ok(steps) => {
                tracing::info!(deck = %label, keywords = deck.len(), report_steps = steps, "Deck done");
            }
            Err(e) => {
                report(&e, &label);
                worst = worst.max(exit_code(&e));
            }
        }
    }

    engine.finish();
    if worst > 0 {
        std::process::exit(worst);
    }
}
