use anyhow::{anyhow, Result};
use clap::Parser;
use reqwest::{header, Client, Url};
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;

#[derive(Parser, Debug)]
#[command(name = "crawler")]
#[command(about = "Fetch pages to JSONL for the indexer")]
struct Cli {
    /// Path to a file with seed URLs (one per line, # for comments)
    #[arg(long)]
    seeds: String,
    /// Output JSONL file path
    #[arg(long, default_value = "./sample_data/crawl.jsonl")]
    output: String,
    /// Follow in-page links instead of fetching the seed list only
    #[arg(long, default_value_t = false)]
    follow_links: bool,
    /// Maximum number of documents to fetch
    #[arg(long, default_value_t = 100)]
    max_docs: usize,
    /// Fetch attempts per URL before giving up
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,
    /// Request timeout seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
    /// Pause between fetches, milliseconds
    #[arg(long, default_value_t = 200)]
    delay_ms: u64,
    /// User-Agent string
    #[arg(long, default_value = "lemma-crawler/0.1 (+https://example.com/bot)")]
    user_agent: String,
    /// When following links, stay on the host the page came from
    #[arg(long, default_value_t = true)]
    same_host_only: bool,
}

#[derive(Serialize)]
struct OutDoc<'a> {
    url: &'a str,
    title: &'a str,
    body: &'a str,
    fetched_at: String,
}

struct Page {
    title: String,
    body: String,
    links: Vec<Url>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Cli::parse();
    if let Some(dir) = std::path::Path::new(&args.output).parent() {
        fs::create_dir_all(dir).ok();
    }

    let client = Client::builder()
        .user_agent(args.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()?;

    let mut frontier: VecDeque<Url> = VecDeque::new();
    for line in BufReader::new(File::open(&args.seeds)?).lines() {
        let s = line?.trim().to_string();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let u = Url::parse(&s).or_else(|_| Url::parse(&format!("https://{s}")));
        if let Ok(u) = u {
            frontier.push_back(u);
        }
    }
    if frontier.is_empty() {
        return Err(anyhow!("no valid seeds"));
    }
    tracing::info!(
        seeds = frontier.len(),
        max_docs = args.max_docs,
        follow_links = args.follow_links,
        output = %args.output,
        "crawl starting"
    );

    let mut out = BufWriter::new(File::create(&args.output)?);
    let mut visited: HashSet<String> = HashSet::new();
    let mut attempts: HashMap<String, u32> = HashMap::new();
    let mut emitted = 0usize;

    let sel_title = Selector::parse("title").unwrap();
    let sel_body = Selector::parse("body").unwrap();
    let sel_a = Selector::parse("a").unwrap();

    while let Some(url) = frontier.pop_front() {
        if emitted >= args.max_docs {
            break;
        }
        let key = norm(&url);
        if visited.contains(&key) {
            continue;
        }
        if args.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(args.delay_ms)).await;
        }

        match fetch_page(&client, &url, &sel_title, &sel_body, &sel_a).await {
            Ok(page) => {
                visited.insert(key.clone());
                let fetched_at = time::OffsetDateTime::now_utc()
                    .format(&Rfc3339)
                    .unwrap_or_default();
                let rec = OutDoc {
                    url: &key,
                    title: page.title.trim(),
                    body: page.body.trim(),
                    fetched_at,
                };
                serde_json::to_writer(&mut out, &rec)?;
                out.write_all(b"\n")?;
                emitted += 1;
                tracing::info!(n = emitted, url = %key, "fetched");

                if args.follow_links {
                    for link in page.links {
                        if args.same_host_only && link.host_str() != url.host_str() {
                            continue;
                        }
                        let link_key = norm(&link);
                        if !visited.contains(&link_key) {
                            frontier.push_back(link);
                        }
                    }
                }
            }
            Err(err) => {
                // Failed URLs go back to the end of the queue, a bounded
                // number of times.
                let tries = attempts.entry(key.clone()).or_insert(0);
                *tries += 1;
                if *tries < args.max_attempts {
                    tracing::warn!(url = %key, attempt = *tries, %err, "fetch failed, requeueing");
                    frontier.push_back(url);
                } else {
                    tracing::warn!(url = %key, %err, "fetch failed, giving up");
                }
            }
        }
    }

    out.flush()?;
    tracing::info!(emitted, visited = visited.len(), output = %args.output, "crawl done");
    Ok(())
}

fn norm(u: &Url) -> String {
    let mut s = u.clone();
    s.set_fragment(None);
    s.to_string()
}

async fn fetch_page(
    client: &Client,
    url: &Url,
    sel_title: &Selector,
    sel_body: &Selector,
    sel_a: &Selector,
) -> Result<Page> {
    let resp = client.get(url.clone()).send().await?;
    if !resp.status().is_success() {
        return Err(anyhow!("status {}", resp.status()));
    }
    if let Some(ct) = resp.headers().get(header::CONTENT_TYPE) {
        if let Ok(v) = ct.to_str() {
            if !v.starts_with("text/html") {
                return Err(anyhow!("not html: {v}"));
            }
        }
    }
    let bytes = resp.bytes().await?;
    if bytes.len() > 2 * 1024 * 1024 {
        return Err(anyhow!("page too large: {} bytes", bytes.len()));
    }
    let html = String::from_utf8_lossy(&bytes).to_string();

    let doc = Html::parse_document(&html);
    let title = doc
        .select(sel_title)
        .next()
        .map(|n| n.text().collect::<String>())
        .unwrap_or_default();
    let body = doc
        .select(sel_body)
        .next()
        .map(|n| n.text().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    let mut links = Vec::new();
    for a in doc.select(sel_a) {
        if let Some(href) = a.value().attr("href") {
            if let Ok(u) = Url::parse(href).or_else(|_| url.join(href)) {
                if u.scheme().starts_with("http") {
                    links.push(u);
                }
            }
        }
    }
    Ok(Page { title, body, links })
}
