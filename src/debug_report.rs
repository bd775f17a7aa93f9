use helpdesk_query::{HitStatus, QueryError, RuleHitSummary, TranslationVerbose};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_run(res: &TranslationVerbose, color: bool) {
    let palette = ansi::Palette::new(color);
    print_header(&res.text, &palette);
    println!("  {} {}", palette.dim("normalized:"), palette.paint(format!("\"{}\"", res.normalized), ansi::BLUE));

    println!("\n{}", palette.paint("━━━ Rules ━━━", ansi::GRAY));
    println!(
        "  {} active of {}: {}",
        palette.paint(res.details.active_rules.len().to_string(), ansi::GREEN),
        res.details.total_rules,
        palette.dim(res.details.active_rules.join(", "))
    );
    if res.details.hits.is_empty() {
        println!("{}", palette.dim("  No rule fired; the default view applies"));
    }
    for hit in &res.details.hits {
        println!("  {}", fmt_hit(hit, &palette));
    }

    println!("\n{}", palette.paint("━━━ Query ━━━", ansi::GRAY));
    if res.spec.criteria().is_empty() {
        println!("{}", palette.dim("  (no criteria)"));
    }
    for (idx, criterion) in res.spec.criteria().iter().enumerate() {
        println!(
            "  {} {} {} {}",
            palette.paint(format!("[{}]", idx), ansi::GRAY),
            palette.paint(criterion.category.name(), ansi::BLUE),
            palette.dim("│"),
            palette.bold(palette.paint(criterion.to_string(), ansi::GREEN)),
        );
    }
    println!(
        "  {} {}  {} {}",
        palette.dim("limit:"),
        palette.paint(res.spec.limit().to_string(), ansi::YELLOW),
        palette.dim("│ order:"),
        palette.paint(res.spec.order().to_string(), ansi::YELLOW)
    );
    println!("  {} {}", palette.dim("summary:"), palette.bold(&res.summary));

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!(
        "  Total: {}  │  Matching: {}  │  Resolve: {}",
        palette.paint(format!("{:?}", res.elapsed), ansi::GREEN),
        palette.paint(format!("{:?}", res.details.matching), ansi::CYAN),
        palette.dim(format!("{:?}", res.details.resolve)),
    );
    println!();
}

pub fn print_error(input: &str, err: &QueryError, color: bool) {
    let palette = ansi::Palette::new(color);
    print_header(input, &palette);
    println!("\n  {} {}", palette.bold(palette.paint("✗", ansi::RED)), palette.paint(err.to_string(), ansi::RED));
    if let QueryError::Ambiguous { .. } = err {
        println!("\n{}", palette.dim("  Tip: keep one term per filter, or set RUST_LOG=helpdesk_query=debug"));
    }
    println!();
}

fn print_header(input: &str, palette: &ansi::Palette) {
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Translating: \"{}\"", input), ansi::CYAN)));
}

fn fmt_hit(hit: &RuleHitSummary, palette: &ansi::Palette) -> String {
    let status = match hit.status {
        HitStatus::Accepted => palette.paint("✓", ansi::GREEN),
        HitStatus::Duplicate | HitStatus::Suppressed => palette.dim(format!("✗ {}", hit.status)),
    };
    format!(
        "{} {} {} {} {}",
        status,
        palette.paint(format!("{}..{}", hit.start, hit.end), ansi::YELLOW),
        palette.paint(&hit.rule, ansi::BLUE),
        palette.dim(format!("\"{}\" →", hit.term)),
        hit.preview
    )
}
