extern crate log;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::*;

use copula_lda::{CopulaFamily, CopulaLda, Corpus, LdaConfig};

//
// Short essay-style corpus. Every sentence becomes one chunk whose words are
// sampled jointly through the copula.
//
const DOCUMENTS: &[&str] = &[
    "In the realm of AI, particularly with the rise of large language models and modern machine learning, it's essential to reflect on the value of classic expert systems. Expert systems encode rules written by human experts",
    "While contemporary AI often operates as a black box, classic expert systems operate on a white box principle. The reasoning process is transparent: IF these conditions are true, THEN this conclusion",
    "Observability pipelines collect telemetry from servers. Metrics, logs and traces flow into storage for dashboards and alerting",
    "Expert systems are built on human knowledge, excelling where data are limited. Modern AI typically requires large amounts of training data",
    "Telemetry collection applications gather metrics and logs. Alerting rules fire when dashboards show anomalies in the traces",
    "Predictability is another strength of expert systems. They consistently produce the same output for identical inputs, making them reliable",
    "This predictability is beneficial in observability. Modern machine learning can exhibit statistical variability and unpredictable behavior with slight shifts in input data",
    "Storage for telemetry must scale. Metrics and traces from every server land in the observability backend",
];

const ITERATIONS: usize = 500;

fn main() {
    env_logger::init();

    let mut corpus = Corpus::from_texts(DOCUMENTS);
    let held_out = corpus.split_held_out(4);
    log::info!(
        "{} training documents, {} held out, vocabulary of {} words",
        corpus.documents.len(),
        held_out.len(),
        corpus.vocabulary.len()
    );
    let config = LdaConfig::new(3)
        .alpha(0.1)
        .beta(0.01)
        .copula(CopulaFamily::Frank, 2.0)
        .random_seed(42);

    let mut lda = match CopulaLda::new(config, corpus.documents.clone(), corpus.vocabulary.len()) {
        Ok(lda) => lda,
        Err(err) => {
            eprintln!("Cannot build model: {err}");
            std::process::exit(1);
        }
    };
    println!(
        "Training copula LDA (K={}, {} tokens, iters={ITERATIONS})...",
        lda.n_topics(),
        lda.n_tokens()
    );
    let before = lda.perplexity();
    if let Err(err) = lda.train(ITERATIONS) {
        eprintln!("Training failed: {err}");
        std::process::exit(1);
    }

    let mut topics_table = Table::new();
    topics_table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Topic ID").fg(Color::Red),
            Cell::new("Words").fg(Color::White),
        ]);
    for (t, words) in lda.top_words(8).into_iter().enumerate() {
        let words = words
            .iter()
            .filter_map(|&(w, score)| {
                corpus
                    .vocabulary
                    .word(w)
                    .map(|word| format!("{word}[{score:.3}]"))
            })
            .collect::<Vec<_>>()
            .join(" ");
        topics_table.add_row(vec![Cell::new(t), Cell::new(words)]);
    }
    println!("{topics_table}");

    match (before, lda.perplexity()) {
        (Ok(before), Ok(after)) => println!("Training perplexity: {before:.3} -> {after:.3}"),
        (_, Err(err)) | (Err(err), _) => eprintln!("Perplexity failed: {err}"),
    }
    match lda.held_out_perplexity(&held_out, 50) {
        Ok(p) => println!("Held-out perplexity ({} documents): {p:.3}", held_out.len()),
        Err(err) => eprintln!("Held-out perplexity failed: {err}"),
    }
}
