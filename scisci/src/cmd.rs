use anyhow::Result;
use clap::{Parser, Subcommand};
use common::agent::Orchestrator;
use common::config::AppConfig;
use common::schema::CATALOG;
use common::tracing::init_tracing;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "scisci")]
#[command(about = "natural-language questions over the SciSciNet paper database", long_about = None)]
pub struct Cli {
    /// Completion model name
    #[arg(long, global = true, env = "SCISCI_MODEL")]
    model: Option<String>,

    /// Postgres connection string
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Base URL of the OpenAI-compatible completion API
    #[arg(long, global = true, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,

    /// Seconds to wait for one completion call
    #[arg(long, global = true, env = "SCISCI_COMPLETION_TIMEOUT_SECS")]
    completion_timeout_secs: Option<u64>,

    /// Attempts per completion call, retrying transient failures
    #[arg(long, global = true, env = "SCISCI_COMPLETION_ATTEMPTS")]
    completion_attempts: Option<usize>,

    /// Seconds to wait for one database query
    #[arg(long, global = true, env = "SCISCI_QUERY_TIMEOUT_SECS")]
    query_timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one question and print the answer envelope as JSON
    Ask {
        /// The question, 1-500 characters
        question: String,
    },

    /// Serve the chat endpoint over HTTP
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,
    },

    /// Print the queryable schema catalog
    Schema,
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let _guard = init_tracing("scisci")?;

        match self.command {
            Commands::Schema => {
                println!("{}", serde_json::to_string_pretty(&CATALOG.describe())?);
                Ok(())
            }
            Commands::Ask { ref question } => {
                let orchestrator = self.build_orchestrator()?;
                ask(&orchestrator, question).await
            }
            Commands::Serve { ref host, port } => {
                let orchestrator = self.build_orchestrator()?;
                crate::server::serve(Arc::new(orchestrator), host, port).await
            }
        }
    }

    /// flags win over values already resolved from the environment
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(model) = &self.model {
            config.model.model = model.clone();
        }
        if let Some(database_url) = &self.database_url {
            config.database_url = Some(database_url.clone());
        }
        if let Some(base_url) = &self.base_url {
            config.model.base_url = base_url.clone();
        }
        if let Some(secs) = self.completion_timeout_secs {
            config.model.timeout_secs = secs;
        }
        if let Some(attempts) = self.completion_attempts {
            config.model.max_attempts = attempts;
        }
        if let Some(secs) = self.query_timeout_secs {
            config.query_timeout_secs = secs;
        }
    }

    fn build_orchestrator(&self) -> Result<Orchestrator> {
        let mut config = AppConfig::from_env()?;
        self.apply_overrides(&mut config);

        build_orchestrator(&config)
    }
}

fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator> {
    tracing::info!(
        model = %config.model.model,
        completion_timeout_secs = config.model.timeout_secs,
        query_timeout_secs = config.query_timeout_secs,
        "configuration resolved"
    );

    Ok(Orchestrator::from_config(config)?)
}

async fn ask(orchestrator: &Orchestrator, question: &str) -> Result<()> {
    if question.trim().is_empty() {
        anyhow::bail!("question is required");
    }

    let answer = orchestrator.answer_message(question).await;
    println!("{}", serde_json::to_string_pretty(&answer)?);
    Ok(())
}
