use aconcat::config::Settings;
use owo_colors::OwoColorize;
use std::error::Error;

pub fn handle_init_config() -> Result<(), Box<dyn Error>> {
    // Check if already initialized
    if Settings::exists()? {
        println!(
            "{} Settings already exist at {}",
            "Note:".yellow(),
            Settings::config_path()?.display()
        );
        return Ok(());
    }

    let path = Settings::new().save()?;

    println!("{} Default settings written", "✓".green().bold());
    println!("Configuration saved to: {}", path.display());

    Ok(())
}
