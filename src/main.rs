//! rainyday CLI - Render rain on glass from a JSON scene.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::RgbaImage;

use rainyday::{
    Canvas, Reflection, Simulator,
    render::{gradient, prepare_background, prepare_reflection},
    schema::{ReflectionPolicy, Scene},
};

/// Colours of the synthetic background used when a scene names no image.
const SKY_TOP: [u8; 3] = [38, 52, 79];
const SKY_BOTTOM: [u8; 3] = [164, 178, 196];

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <scene.json> [duration_ms]", args[0]);
        eprintln!();
        eprintln!("Render rain drops sliding down a window from a JSON scene.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  scene.json   Path to scene file");
        eprintln!("  duration_ms  Virtual time to simulate (default: 10000)");
        eprintln!();
        eprintln!("Example scene is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_scene();
        return;
    }

    let scene_path = PathBuf::from(&args[1]);
    let duration_ms: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10_000);

    let scene = Scene::from_file(&scene_path).unwrap_or_else(|e| {
        eprintln!("Error loading scene: {}", e);
        std::process::exit(1);
    });
    let config = &scene.config;

    println!("rainyday");
    println!("========");
    println!("Surface: {}x{}", config.width, config.height);
    println!(
        "Policies: gravity {:?}, trail {:?}, reflection {:?}, collision {:?} (enabled: {})",
        config.gravity, config.trail, config.reflection, config.collision, config.collisions
    );
    println!("Presets: {}", scene.presets.len());
    println!("Spawn interval: {}ms", scene.speed);
    println!("Duration: {}ms", duration_ms);
    println!();

    let source = load_source(&scene, &scene_path);
    let background = prepare_background(&source, config.width, config.height, config.blur_radius);
    let reflection_source = match config.reflection {
        ReflectionPolicy::Miniature => Some(prepare_reflection(&source, config.width, config.height)),
        ReflectionPolicy::None => None,
    };
    let reflection = Reflection::from_policy(config.reflection, reflection_source, config.fill_color);

    let surface = Canvas::new(config.width, config.height);
    let mut simulator =
        Simulator::new(scene.config.clone(), surface, reflection).unwrap_or_else(|e| {
            eprintln!("Error creating simulator: {}", e);
            std::process::exit(1);
        });

    if let Err(e) = simulator.start(&scene.presets, scene.speed) {
        eprintln!("Error starting rain: {}", e);
        std::process::exit(1);
    }

    println!("Running simulation...");
    let start = Instant::now();
    let step = (duration_ms / 10).max(1);
    let mut simulated = 0;

    while simulated < duration_ms {
        let chunk = step.min(duration_ms - simulated);
        simulator.advance(chunk);
        simulated += chunk;

        let stats = simulator.stats();
        println!(
            "  t={}ms: spawned={}, active={}, exited={}, merged={}",
            simulated, stats.spawned, stats.active, stats.exited, stats.merged
        );
    }

    let elapsed = start.elapsed();
    let stats = simulator.stats();

    println!();
    println!("Final state:");
    println!("{}", serde_json::to_string_pretty(&stats).unwrap_or_default());
    println!("Time: {:.2}s", elapsed.as_secs_f32());

    let opacity = scene.config.opacity;
    let composite = simulator.into_surface().composite(&background, opacity);
    if let Err(e) = composite.save(&scene.output) {
        eprintln!("Error writing {}: {}", scene.output.display(), e);
        std::process::exit(1);
    }
    println!("Wrote {}", scene.output.display());
}

/// Background source image: the scene's image if it names one (relative to
/// the scene file), else a synthetic sky gradient.
fn load_source(scene: &Scene, scene_path: &Path) -> RgbaImage {
    let (width, height) = (scene.config.width, scene.config.height);
    let Some(path) = &scene.background else {
        return gradient(width, height, SKY_TOP, SKY_BOTTOM);
    };

    let path = match scene_path.parent() {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.clone(),
    };
    image::open(&path)
        .map(|img| img.to_rgba8())
        .unwrap_or_else(|e| {
            eprintln!("Error reading background {}: {}", path.display(), e);
            std::process::exit(1);
        })
}

fn print_example_scene() {
    let scene = Scene::default();

    println!("Example scene (scene.json):");
    match serde_json::to_string_pretty(&scene) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing scene: {}", e),
    }
}
