mod cli;

use anyhow::{anyhow, bail, Context, Result};
use footprint_operand::{
    config::Config,
    engine::{run_operand, ArgSlot, Invocation, PatchPlan},
    host::{
        memory::footprint_report, settings::SettingsBlob, DirectoryHost, HostMode, MemoryHost,
        OperandArgs,
    },
    printer::ResultPrinter,
};
use is_terminal::IsTerminal;
use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` overrides the default `info` filter. Logs go to stderr so that
/// stdout only carries results.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn arg_slot(cli_value: Option<&str>, cfg: &Config, key: &str) -> Result<ArgSlot> {
    let raw = match cli_value {
        Some(v) => v.to_string(),
        None => cfg.require(key)?,
    };
    ArgSlot::parse(&raw).ok_or_else(|| anyhow!("{}: expected one of hx, hy, px, py; got {:?}", key, raw))
}

fn parse_extents(text: &str) -> Result<[f64; 4]> {
    let values = text
        .split(',')
        .map(|s| s.trim().parse::<f64>().with_context(|| format!("invalid extent {:?}", s)))
        .collect::<Result<Vec<_>>>()?;
    values
        .try_into()
        .map_err(|v: Vec<f64>| anyhow!("--dry-run needs 4 comma separated values, got {}", v.len()))
}

fn main() -> Result<()> {
    init_logging();
    let args = cli::Cli::parse();
    let cfg = Config::load();

    let plan = PatchPlan {
        key: match args.key.clone() {
            Some(key) => key,
            None => cfg.require("OPERAND_PATCH_KEY")?,
        },
        guard: arg_slot(args.guard_arg.as_deref(), &cfg, "OPERAND_GUARD_ARG")?,
        value: arg_slot(args.value_arg.as_deref(), &cfg, "OPERAND_VALUE_ARG")?,
    };
    let invocation = Invocation {
        plan,
        report_name: match args.report_name.clone() {
            Some(name) => name,
            None => cfg.require("OPERAND_REPORT_NAME")?,
        },
    };

    let mode_text = match args.mode.clone() {
        Some(mode) => mode,
        None => cfg.require("OPERAND_MODE")?,
    };
    let Some(mode) = HostMode::parse(&mode_text) else {
        bail!("unknown host mode: {}", mode_text);
    };
    let capacity = match args.result_length {
        Some(n) => n,
        None => cfg.require_usize("OPERAND_RESULT_LENGTH")?,
    };
    let operand_args = OperandArgs { hx: args.hx, hy: args.hy, px: args.px, py: args.py };

    let extents = if let Some(extents_arg) = args.dry_run.as_deref() {
        let canned = parse_extents(extents_arg)?;
        let scratch = tempfile::tempdir()?;
        let mut host = MemoryHost::new(scratch.path())
            .with_settings(SettingsBlob::from_pairs([(invocation.plan.key.as_str(), "0")]))
            .with_report(footprint_report(canned));
        host.args = operand_args;
        host.mode = mode;
        host.capacity = capacity;
        run_operand(&mut host, &invocation)?
    } else {
        let dir = args.dir.clone().unwrap_or_else(|| cfg.host_dir());
        tracing::info!(dir = %dir.display(), "using samples directory");
        let mut host = DirectoryHost::new(dir, operand_args)
            .with_mode(mode)
            .with_capacity(capacity)
            .with_compute_cmd(args.compute_cmd.clone().or_else(|| cfg.get("OPERAND_COMPUTE_CMD")))
            .with_results_file(args.results_file.clone().or_else(|| cfg.get_path("OPERAND_RESULTS_FILE")));
        run_operand(&mut host, &invocation)?
    };

    let printer = ResultPrinter {
        color: !args.json && std::io::stdout().is_terminal(),
        json: args.json,
    };
    printer.print(&extents).context("cannot encode results")?;
    Ok(())
}
