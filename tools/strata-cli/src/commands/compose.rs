//! Convert an editor composition into a render plan or EDL.

use std::path::PathBuf;

use strata_project_model::composition::Composition;

pub fn run(path: PathBuf, output: Option<PathBuf>, edl: bool) -> anyhow::Result<()> {
    let composition = Composition::load(&path)
        .map_err(|e| anyhow::anyhow!("Failed to load composition: {e}"))?;

    let json = if edl {
        serde_json::to_string_pretty(&composition.to_edl())?
    } else {
        let plan = composition.build_render_plan();
        plan.validate()
            .map_err(|e| anyhow::anyhow!("Composition produced an invalid plan: {e}"))?;
        tracing::info!(
            layers = plan.layers.len(),
            audio_segments = plan.audio.len(),
            duration = plan.total_duration,
            "Composition flattened"
        );
        serde_json::to_string_pretty(&plan)?
    };

    match output {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&out, json)?;
            println!("Wrote {}", out.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
