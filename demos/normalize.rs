use std::time::Instant;

use tn_rs::{
    engines::en::{EnglishGrammarParamsBuilder, EnglishNormalizeParams, EnglishNormalizer},
    tagged, CasePolicy, NormalizationEngine,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let text = args.next().unwrap_or_else(|| {
        "Dr. Smith paid $12.05 for 2.5 kg of IV bags on 23 4/5 days; mail cdf1@abc.edu.".to_string()
    });
    let n_best: usize = args.next().and_then(|n| n.parse().ok()).unwrap_or(3);

    let mut normalizer = EnglishNormalizer::with_cache(std::env::temp_dir().join("tn-rs"), false);

    let load_start = Instant::now();
    let params = EnglishGrammarParamsBuilder::default()
        .deterministic(false)
        .build()?;
    normalizer.load_grammars_with_params(params)?;
    println!("Grammars loaded in {:.2?}", load_start.elapsed());

    let classify_start = Instant::now();
    let readings = normalizer.classify_text(&text, CasePolicy::Cased, false, 1)?;
    if let Some(best) = readings.first() {
        let tokens = tagged::parse(&best.tagged)?;
        println!("Tagged in {:.2?}:", classify_start.elapsed());
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    }

    let normalize_start = Instant::now();
    let results = normalizer.normalize(&text, Some(EnglishNormalizeParams { n_best }))?;
    println!("Normalized in {:.2?}:", normalize_start.elapsed());
    println!("{}", serde_json::to_string_pretty(&results)?);

    normalizer.unload_grammars();
    Ok(())
}
