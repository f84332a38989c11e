mod bootstrap;
mod report;

use anyhow::Result;
use dashboard_core::settings::Settings;
use dashboard_data::loader::LoadOptions;
use dashboard_runtime::DashboardState;
use dashboard_ui::App;

fn main() -> Result<()> {
    let settings = Settings::load();
    settings.validate()?;

    bootstrap::setup_logging(
        &settings.log_level,
        settings.log_file.as_deref(),
        settings.view == "dashboard",
    )?;

    tracing::info!("Sales dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Pattern: {}, Data dir: {}, View: {}, Theme: {}",
        settings.pattern,
        settings.data_dir.display(),
        settings.view,
        settings.theme
    );

    let options = LoadOptions::new(settings.pattern.clone())
        .with_data_dir(settings.data_dir.clone())
        .with_columns(settings.column_mapping())
        .with_policy(settings.load_policy());
    let state = DashboardState::load(options);

    match settings.view.as_str() {
        "report" => {
            let text =
                report::render_report(&state, &settings.currency_symbol, settings.branch.as_deref())?;
            print!("{}", text);
        }
        "json" => {
            let value = report::render_json(&state, settings.branch.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        _ => {
            let app = App::new(
                state,
                &settings.theme,
                settings.currency_symbol.clone(),
                settings.branch.as_deref(),
            );
            app.run()?;
        }
    }

    tracing::info!("Sales dashboard exiting");
    Ok(())
}
