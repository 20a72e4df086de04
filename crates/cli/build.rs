use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("legible")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract the readable article from a web page or HTML file")
        .arg(clap::arg!([INPUT] "URL to fetch, local HTML file, or '-' for stdin"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (markdown, html, text, json)")
                .default_value("markdown")
                .value_parser(["markdown", "md", "html", "text", "txt", "json"]),
        )
        .arg(clap::arg!(-e --encoding <CHARSET> "Charset to decode the input with, overriding any declaration"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests"))
        .arg(
            clap::arg!(-H --header <HEADER> "Extra request header, as \"Name: value\" (repeatable)")
                .action(clap::ArgAction::Append),
        )
        .arg(clap::arg!(--proxy <URL> "Proxy URL for HTTP requests"))
        .arg(clap::arg!(--"accept-error-status" "Extract from non-2xx responses instead of failing"))
        .arg(
            clap::arg!(-s --strip <SELECTOR> "CSS selector whose matches are stripped before extraction (repeatable)")
                .action(clap::ArgAction::Append),
        )
        .arg(
            clap::arg!(--"char-threshold" <NUM> "Minimum character threshold for content candidates")
                .default_value("500"),
        )
        .arg(clap::arg!(--"min-score" <SCORE> "Minimum score of the winning content candidate").default_value("20"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"))
        .arg(
            clap::arg!(--completions <SHELL> "Print a shell completion script and exit")
                .value_parser(["bash", "elvish", "fish", "powershell", "zsh"]),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "legible", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "legible", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "legible", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "legible", &completions_dir).unwrap();
}
