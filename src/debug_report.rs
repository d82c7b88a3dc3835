use querylex::{Error, Options, ScanMetrics, ScanRun, Token};

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

pub fn print_run(input: &str, options: &Options, run: &ScanRun, color: bool) {
    let palette = ansi::Palette::new(color);
    print_header(input, options, &palette);

    println!("\n{}", palette.paint("━━━ Tree ━━━", ansi::GRAY));
    for token in run.tree.iter() {
        println!("  {}", fmt_token(token, &palette));
    }

    println!("\n{}", palette.paint("━━━ Scan ━━━", ansi::GRAY));
    print_metrics(&run.metrics, run.tree.node_count(), &palette);

    println!("\n{}", palette.paint("━━━ Timing ━━━", ansi::GRAY));
    println!("  Total: {}", palette.paint(format!("{:?}", run.metrics.elapsed), ansi::GREEN));
    println!();
}

pub fn print_error(input: &str, err: &Error, color: bool) {
    let palette = ansi::Palette::new(color);
    eprintln!("{} {}", palette.bold(palette.paint("error:", ansi::RED)), err);

    let Some(position) = err.position() else {
        if let Error::UnterminatedContext { .. } = err {
            eprintln!("{}", palette.dim("  Tip: a bracket or parenthesis is probably left open"));
        }
        return;
    };

    let line = input.lines().nth(position.line - 1).unwrap_or("");
    let gutter = format!("{} | ", position.line);
    eprintln!("  {}{}", palette.dim(&gutter), line);
    eprintln!(
        "  {}{}",
        " ".repeat(gutter.len() + position.column - 1),
        palette.bold(palette.paint("^", ansi::RED))
    );
}

fn print_header(input: &str, options: &Options, palette: &ansi::Palette) {
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Scanning: \"{}\"", input), ansi::CYAN)));
    let limit = options.max_steps.map_or_else(|| "none".to_string(), |n| n.to_string());
    println!(
        "  {} {}  {} {}",
        palette.dim("start:"),
        palette.paint(&options.start_context, ansi::BLUE),
        palette.dim("│ step limit:"),
        palette.paint(limit, ansi::YELLOW)
    );
}

fn print_metrics(metrics: &ScanMetrics, nodes: usize, palette: &ansi::Palette) {
    let count = |n: usize| palette.paint(n.to_string(), ansi::YELLOW);

    println!(
        "  {} {}  {} {}  {} {}",
        palette.paint("Steps:", ansi::BLUE),
        count(metrics.steps),
        palette.dim("consumed:"),
        count(metrics.consumed_steps),
        palette.dim("lookahead:"),
        count(metrics.lookahead_steps),
    );
    println!(
        "  {} {}  {} {}  {} {}  {} {}",
        palette.paint("Levels:", ansi::BLUE),
        count(metrics.descents),
        palette.dim("closed:"),
        count(metrics.ascents),
        palette.dim("at end of input:"),
        count(metrics.auto_closed),
        palette.dim("max depth:"),
        count(metrics.max_depth),
    );
    println!(
        "  {} {}  {} {}",
        palette.paint("Switches:", ansi::BLUE),
        count(metrics.switches),
        palette.dim("│ nodes:"),
        count(nodes),
    );
}

fn fmt_token(token: Token<'_>, palette: &ansi::Palette) -> String {
    let span = token.span();
    let detail = if token.is_root() {
        palette.dim(format!("start {}", token.context()))
    } else {
        palette.dim(format!("{}..{} in {}", span.start, span.end, token.context()))
    };

    format!(
        "{}{} {} {}",
        "  ".repeat(token.depth()),
        palette.paint(token.rule_name(), ansi::BLUE),
        palette.bold(palette.paint(format!("'{}'", token.accumulated_text()), ansi::GREEN)),
        detail
    )
}
