use std::f64::consts::TAU;
use std::path::PathBuf;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use solar_orrery::file::{self, BodyRecord, FileError};
use solar_orrery::model::catalog;
use solar_orrery::scene::SceneConfig;

#[derive(Debug, Parser)]
struct Args {
    name: String,
    /// Body table to look in. Defaults to the built-in solar system.
    #[arg(long)]
    bodies: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let records: Vec<BodyRecord> = match &args.bodies {
        Some(path) => file::read_file(path)?,
        None => catalog::solar_system_catalog()
            .into_iter()
            .map(|entry| BodyRecord { entry, phase: None })
            .collect(),
    };

    let record = records
        .iter()
        .find(|r| r.entry.name.eq_ignore_ascii_case(&args.name))
        .ok_or_else(|| FileError::UnknownBody(args.name.clone()))?;

    // Phase only matters if the table leaves it random; pin it for display
    let body = record.to_descriptor(&mut StdRng::seed_from_u64(0));
    let config = SceneConfig::default();

    println!("Characteristics for {}", body.name);
    println!("- Mean radius: {}", body.mean_radius);
    println!(
        "- Rendered radius: {:.3}",
        body.mean_radius * config.radius_scale
    );
    println!("- Orbit distance: {}", body.orbit_distance);
    println!("- Angular speed: {} rad/s", body.angular_speed_factor);
    if body.is_central() || body.angular_speed_factor == 0.0 {
        println!("- Orbital period: none (central body)");
    } else {
        println!(
            "- Orbital period: {:.1} s",
            TAU / body.angular_speed_factor.abs()
        );
    }
    println!("- Direction: {:?}", body.direction);
    match record.phase {
        Some(phase) => println!("- Initial phase: {} rad", phase),
        None => println!("- Initial phase: random"),
    }
    let c = body.fallback_color;
    println!(
        "- Fallback color: #{:02x}{:02x}{:02x}",
        (c.r * 255.0).round() as u8,
        (c.g * 255.0).round() as u8,
        (c.b * 255.0).round() as u8
    );
    println!("- Emissive: {}", body.is_emissive);
    println!("- Texture: {}", body.texture_file_name(&config.texture_extension));

    Ok(())
}
