use std::io::{self, Write};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use core_types::InstanceId;
use engine::{Callbacks, Instance, InstanceConfig, StyleRegistry, SystemTimer};
use mimalloc::MiMalloc;
use render::{Container, InputField, RenderTarget, text_with_cursor};

mod cli;
mod logger;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// Restore the saved terminal position and clear everything below it.
const REWIND: &str = "\x1b8\x1b[J";
const SAVE: &str = "\x1b7";

fn redraw(instance: &Instance) {
    let text = instance.text();
    let frame = match instance.styles().cursor_style(instance.id()) {
        Some(style) if style.visible => {
            let cursor_char = style.cursor_char.chars().next().unwrap_or('|');
            text_with_cursor(&text, instance.cursor(), cursor_char)
        }
        _ => text,
    };
    let mut stdout = io::stdout().lock();
    let _ = write!(stdout, "{REWIND}{frame}");
    let _ = stdout.flush();
}

fn main() {
    if let Err(err) = logger::init_from_env() {
        eprintln!("logging disabled: {err}");
    }
    let opts = cli::Opts::parse();
    let options = match opts.load_options() {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };

    let callbacks = Callbacks::default()
        .after_step(|_, _, instance| redraw(instance))
        .after_complete(redraw);
    let config = InstanceConfig::new(InstanceId(1), options)
        .callbacks(callbacks)
        .timer(Arc::new(SystemTimer::new()))
        .styles(StyleRegistry::new());
    let target: Box<dyn RenderTarget + Send> = if opts.input {
        Box::new(InputField::new())
    } else {
        Box::new(Container::new())
    };
    let mut instance = Instance::build(config, target);

    if opts.exit_after_ms > 0 {
        let handle = instance.handle();
        let after = Duration::from_millis(opts.exit_after_ms);
        std::thread::spawn(move || {
            std::thread::sleep(after);
            handle.destroy();
        });
    }

    print!("{SAVE}");
    let outcome = instance.init();
    println!();
    log::info!(target: "typist", "finished: {outcome:?}");
}
