use clap::{Parser, Subcommand};
use glam::Vec3;
use rexfmt::codec::Image;
use rexfmt::io_stream::{DecodeOptions, Decoder, Encoder};
use rexfmt::{BlockCodec, BlockType, Crs, File, SceneNode};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rex", about = "Inspect and generate REX 3D scene files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the header and every block of a REX file
    Info {
        input: PathBuf,
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
        /// Fail on a foreign magic or a truncated stream
        #[arg(long)]
        strict: bool,
    },
    /// Extract an image block's data (stdout unless -o is given)
    Img {
        id: u64,
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a demo scene: one cube, its material and two instances
    Cube {
        #[arg(short, long)]
        output: PathBuf,
        /// Cube edge length
        #[arg(short, long, default_value = "1.0")]
        size: f32,
        /// SRID stored in the coordinate system preamble
        #[arg(long, default_value = "3876")]
        srid: u32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    match Cli::parse().command {

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input, json, strict } => {
            let options = if strict { DecodeOptions::default() } else { DecodeOptions::lenient() };
            let mut decoder = Decoder::with_options(BufReader::new(std::fs::File::open(&input)?), options);
            let file = decoder.decode()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&file.summary())?);
                return Ok(());
            }
            if let Some(header) = decoder.header() {
                println!("── REX File ─────────────────────────────────────────────");
                println!("  Path           {}", input.display());
                print!("{header}");
            }
            print_listing(&file);
        }

        // ── Img ──────────────────────────────────────────────────────────────
        Commands::Img { id, input, output } => {
            let reader = BufReader::new(std::fs::File::open(&input)?);
            let mut decoder = Decoder::with_options(reader, DecodeOptions::lenient());
            let (header, payload) = decoder
                .extract_payload(id)?
                .ok_or_else(|| format!("No block with id {id} in {}", input.display()))?;
            if header.block_type != BlockType::Image {
                return Err(format!("Block {id} is a {}, not an image", header.block_type).into());
            }
            let image = Image::decode(&payload, &header)?;
            match output {
                Some(path) => std::fs::write(&path, &image.data)?,
                None => {
                    let mut out = std::io::stdout().lock();
                    out.write_all(&image.data)?;
                    out.flush()?;
                }
            }
        }

        // ── Cube ─────────────────────────────────────────────────────────────
        Commands::Cube { output, size, srid } => {
            let (mesh, material) = rexfmt::shapes::cube(1, 2, size);
            let mut file = File::with_crs(Crs { srid, ..Crs::default() });
            file.scene_nodes.push(SceneNode::placing(3, mesh.id, Vec3::new(-5.0, 0.0, 0.0)));
            file.scene_nodes.push(SceneNode::placing(4, mesh.id, Vec3::new(5.0, 0.0, 0.0)));
            file.meshes.push(mesh);
            file.materials.push(material);

            let mut writer = BufWriter::new(std::fs::File::create(&output)?);
            let n = Encoder::new(&mut writer).encode(&file)?;
            writer.flush()?;
            println!("Created: {} ({n} bytes)", output.display());
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn print_listing(file: &File) {
    let reference = |r: Option<u64>| r.map_or_else(|| "-".to_owned(), |v| v.to_string());

    if !file.meshes.is_empty() {
        println!("Meshes ({})", file.meshes.len());
        println!("{:>10} {:>8} {:>8} {:>12} Name", "ID", "#Vtx", "#Tri", "Material");
        for m in &file.meshes {
            println!("{:>10} {:>8} {:>8} {:>12} {}",
                m.id, m.vertex_count(), m.triangle_count(), reference(m.material_id), m.name);
        }
    }
    if !file.materials.is_empty() {
        println!("Materials ({})", file.materials.len());
        println!("{:>10} {:>20} {:>20} {:>20} {:>6} {:>7} TextureID (ADS)",
            "ID", "Ambient", "Diffuse", "Specular", "Ns", "Opacity");
        for m in &file.materials {
            let [a, d, s] = m.textures().map(reference);
            println!("{:>10} {:>20} {:>20} {:>20} {:>6.1} {:>7.2} [{a},{d},{s}]",
                m.id, rgb(m.ka_rgb), rgb(m.kd_rgb), rgb(m.ks_rgb), m.ns, m.alpha);
        }
    }
    if !file.images.is_empty() {
        println!("Images ({})", file.images.len());
        println!("{:>10} {:>11} {:>12}", "ID", "Compression", "Bytes");
        for img in &file.images {
            println!("{:>10} {:>11} {:>12}", img.id, img.compression.name(), img.data.len());
        }
    }
    for (label, sets) in [
        ("PointLists", file.point_lists.iter().map(|p| (p.id, p.points.len(), p.colors.len())).collect::<Vec<_>>()),
        ("LineSets",   file.line_sets.iter().map(|l| (l.id, l.points.len(), l.colors.len())).collect()),
    ] {
        if sets.is_empty() { continue; }
        println!("{label} ({})", sets.len());
        println!("{:>10} {:>8} {:>8}", "ID", "#Vtx", "#Col");
        for (id, points, colors) in sets {
            println!("{id:>10} {points:>8} {colors:>8}");
        }
    }
    if !file.scene_nodes.is_empty() {
        println!("SceneNodes ({})", file.scene_nodes.len());
        println!("{:>10} {:>10} {:>24} Name", "ID", "Geometry", "Translation");
        for n in &file.scene_nodes {
            println!("{:>10} {:>10} {:>24} {}",
                n.id, reference(n.geometry_id), rgb(n.translation), n.name);
        }
    }
    if !file.tracks.is_empty() {
        println!("Tracks ({})", file.tracks.len());
        println!("{:>10} {:>26} {:>8}", "ID", "Captured", "#Points");
        for t in &file.tracks {
            let when = t.captured_at()
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| t.timestamp.to_string());
            println!("{:>10} {:>26} {:>8}", t.id, when, t.points.len());
        }
    }
    if file.unknown_blocks > 0 {
        println!("Unknown blocks ({})", file.unknown_blocks);
    }
    if file.invalid_blocks > 0 {
        println!("Invalid blocks skipped ({})", file.invalid_blocks);
    }
    if file.truncated {
        println!("Warning: stream ended inside a block; listing is incomplete");
    }
}

fn rgb(v: Vec3) -> String {
    format!("[{:.2},{:.2},{:.2}]", v.x, v.y, v.z)
}
