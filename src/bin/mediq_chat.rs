//! Interactive console for exercising the answer pipeline without the web
//! layer: seed sample records, ask questions, watch the fallback tiers.

use std::io::{BufRead, Write};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use mediq::service::ChatService;
use mediq::store::{MemoryRecordStore, RecordStore};
use mediq::MediqConfig;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut patient: Option<String> = None;
    let mut question: Option<String> = None;
    let mut seed = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--patient" | "-p" => {
                if i + 1 < args.len() {
                    patient = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--question" | "-q" => {
                if i + 1 < args.len() {
                    question = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--seed" => seed = true,
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = MediqConfig::from_env()?;
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let service = ChatService::new(&config, Arc::clone(&store));

    if seed {
        seed_records(&service)?;
        eprintln!("Seeded 4 sample records");
    }

    let runtime = tokio::runtime::Runtime::new()?;

    if let Some(question) = question {
        let reply = runtime.block_on(service.answer(&question, patient.as_deref()));
        println!("{}", reply.reply);
        return Ok(());
    }

    // REPL
    println!("mediq console - type a question, or 'quit' to exit");
    if let Some(id) = &patient {
        println!("(scope: patient {id})");
    }
    let stdin = std::io::stdin();
    loop {
        print!("ask> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }
        let reply = runtime.block_on(service.answer(line, patient.as_deref()));
        println!("{}\n", reply.reply);
    }

    Ok(())
}

fn seed_records(service: &ChatService) -> anyhow::Result<()> {
    service.ingest(
        "p001_admission.txt",
        "Name: Maria Santos Garcia Age: 58 Gender: F ID: P001\n\
         CHIEF COMPLAINT: polyuria and fatigue\n\
         DIAGNOSIS: Type 2 Diabetes\n\
         MEDICATIONS: metformin 500mg twice daily",
        Some("P001"),
    )?;
    service.ingest(
        "p001_labs.txt",
        "TEST RESULTS: HbA1c 8.2%, fasting glucose 162 mg/dL\n\
         ASSESSMENT: poorly controlled, adjust dosing",
        Some("P001"),
    )?;
    service.ingest(
        "p002_visit.txt",
        "Name: David Okafor Jones Age: 41 Gender: M ID: P002\n\
         CHIEF COMPLAINT: persistent cough\n\
         DIAGNOSIS: seasonal bronchitis",
        Some("P002"),
    )?;
    service.ingest(
        "walkin_note.txt",
        "Name: Jane Q Public Age: 45 Gender: F ID: 4471\n\
         DIAGNOSIS: migraine without aura\n\
         Hospital: City General",
        None,
    )?;
    Ok(())
}

fn print_help() {
    println!(
        r#"mediq console

USAGE:
    mediq-chat [OPTIONS]

OPTIONS:
    -p, --patient <ID>     Scope questions to one patient id
    -q, --question <TEXT>  Ask one question and exit
    --seed                 Load sample patient records first
    --help                 Print this help

ENVIRONMENT:
    MEDIQ_EMBEDDING_PROVIDER   hash (default) | ollama | openai
    MEDIQ_LLM_PROVIDER         none (default) | gemini | ollama
    GEMINI_API_KEY             API key for the gemini provider
"#
    );
}
