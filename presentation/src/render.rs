use colored::Colorize;
use domain::categorizer::Category;
use domain::models::{group_by_topic, DocumentStats, QueryOutcome, ScoredChunk};
use infrastructure::vector_store::IndexStats;
use shared::utils::preview;

pub fn print_outcome(outcome: &QueryOutcome, verbose: bool) {
    match outcome {
        QueryOutcome::Answer { text, sources } => {
            println!("\n{}\n", text);
            print_sources(sources);
        }
        QueryOutcome::Failure { reason } => {
            println!(
                "{}",
                "Sorry, I couldn't answer that right now. Please try again.".yellow()
            );
            if verbose {
                println!("{} {}", "Details:".dimmed(), reason);
            } else {
                println!("{}", "(run with --verbose for details)".dimmed());
            }
        }
    }
}

fn print_sources(sources: &[ScoredChunk]) {
    if sources.is_empty() {
        return;
    }
    println!("{}", "Sources:".green().bold());
    for (topic, members) in group_by_topic(sources) {
        let category = members
            .first()
            .map(|s| s.chunk.metadata.category)
            .unwrap_or(Category::General);
        let pages = page_list(&members);
        println!(
            "  {} {} [{}] ({} passage{}{})",
            "•".blue(),
            topic,
            category,
            members.len(),
            if members.len() == 1 { "" } else { "s" },
            if pages.is_empty() {
                String::new()
            } else {
                format!(", p. {pages}")
            }
        );
    }
}

/// Distinct 1-based page numbers, ascending: "3, 7".
fn page_list(members: &[&ScoredChunk]) -> String {
    let mut pages: Vec<usize> = members
        .iter()
        .filter_map(|s| s.chunk.metadata.page)
        .map(|p| p + 1)
        .collect();
    pages.sort_unstable();
    pages.dedup();
    pages
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn print_search_results(query: &str, results: &[ScoredChunk]) {
    let rule = "=".repeat(80);
    println!("\n{rule}\nQuery: {query}\n{rule}\n");
    if results.is_empty() {
        println!("{}", "No passages found.".yellow());
        return;
    }
    for (i, result) in results.iter().enumerate() {
        let meta = &result.chunk.metadata;
        println!(
            "{} (similarity: {:.3})",
            format!("Result {}", i + 1).green().bold(),
            result.similarity()
        );
        println!("   Topic: {}", meta.topic);
        println!("   Category: {}", meta.category);
        if let Some(page) = meta.page {
            println!("   Page: {}", page + 1);
        }
        println!("   Content: {}", preview(&result.chunk.text, 200));
        println!("   {}\n", "-".repeat(76));
    }
}

pub fn print_document_stats(stats: &DocumentStats) {
    println!("{}", "DOCUMENT STATISTICS:".green().bold());
    println!("  Total pages: {}", stats.total_pages);
    println!("  Total characters: {}", stats.total_characters);
    println!("  Avg page length: {:.0} chars", stats.avg_page_length);
    println!("  Unique PDFs: {}", stats.unique_sources);
}

pub fn print_index_stats(stats: &IndexStats) {
    println!("{}", "VECTOR INDEX STATS:".green().bold());
    println!("  Total embeddings: {}", stats.total_embeddings);
    println!("  Embedding dimension: {}", stats.embedding_dimension);
    println!("  Embedding model: {}", stats.embedding_model);
}

pub fn print_breakdown(title: &str, unit: &str, counts: &[(Category, usize)]) {
    println!("{}", title.green().bold());
    for (category, count) in counts {
        println!("  {}: {} {}", category.as_str().to_uppercase(), count, unit);
    }
}
