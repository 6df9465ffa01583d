use resxsync_translate::LANGUAGES;

use crate::Format;

pub fn run_languages(format: Format) -> color_eyre::Result<()> {
    match format {
        Format::Json => {
            let list: Vec<_> = LANGUAGES
                .iter()
                .map(|l| serde_json::json!({ "code": l.code, "name": l.name }))
                .collect();
            serde_json::to_writer_pretty(std::io::stdout().lock(), &list)?;
            println!();
        }
        Format::Text => {
            for l in LANGUAGES {
                crate::ui_out!("{:<6} {}", l.code, l.name);
            }
        }
    }
    Ok(())
}
