//! Answers questions against the FAQ knowledge base from the command line.
//!
//! Uses `FAQ_KB_PATH` when set, otherwise the built-in table. Handy for
//! checking topic order in a custom table before deploying it.
//!
//! ```text
//! ask_faq "Is the gold insured?" "What are the fees?"
//! ```

use aurum_vision_api::knowledge_base::KnowledgeBase;
use dotenvy::dotenv;
use std::env;

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let kb = match env::var("FAQ_KB_PATH") {
        Ok(path) if !path.trim().is_empty() => KnowledgeBase::from_file(path)?,
        _ => KnowledgeBase::builtin(),
    };

    let questions: Vec<String> = env::args().skip(1).collect();
    if questions.is_empty() {
        println!("Topics (match order):");
        for entry in kb.entries() {
            println!("- {}: {}", entry.topic(), entry.keywords().join(", "));
        }
        return Ok(());
    }

    for question in questions {
        let topic = kb.find(&question).map(|e| e.topic()).unwrap_or("(default)");
        println!("Q: {}\n[{}] {}\n", question, topic, kb.answer(&question));
    }

    Ok(())
}
