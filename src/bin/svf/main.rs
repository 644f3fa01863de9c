//! SVF CLI - Tool for inspecting decoded SVF derivative files.

use std::env;
use std::process::ExitCode;

use svf::geom::{parse_fragments_from_file, parse_geometry_metadata_from_file, parse_mesh_pack_from_file, Mesh};
use svf::material::parse_materials_from_file;
use svf::pack::PackFile;
use svf::propdb::{PropDb, WalkOptions};

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    let mut verbose = false;
    let mut quiet = false;
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            "-q" | "--quiet" => quiet = true,
            _ => filtered_args.push(arg),
        }
    }
    init_tracing(verbose, quiet);

    if filtered_args.is_empty() {
        print_help();
        return ExitCode::SUCCESS;
    }

    let result = match (filtered_args[0], filtered_args.get(1)) {
        ("info", Some(path)) => cmd_info(path),
        ("fragments", Some(path)) => cmd_fragments(path),
        ("geometries", Some(path)) => cmd_geometries(path),
        ("meshes", Some(path)) => cmd_meshes(path),
        ("materials", Some(path)) => cmd_materials(path),
        ("props", Some(dir)) => cmd_props(dir, filtered_args.get(2).copied()),
        ("help" | "-h" | "--help", _) => {
            print_help();
            Ok(())
        }
        (cmd, _) => {
            eprintln!("Unknown or incomplete command: {cmd}");
            print_help();
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!("svf-cli - inspect Autodesk SVF derivative files");
    println!();
    println!("Usage: svf-cli [-v|-q] <command> <path>");
    println!();
    println!("Commands:");
    println!("  info <pack>           Show pack file header and type table");
    println!("  fragments <pack>      Decode FragmentList.pack");
    println!("  geometries <pf>       Decode GeometryMetadata.pf");
    println!("  meshes <pf>           Decode a numeric <n>.pf mesh pack");
    println!("  materials <json.gz>   Decode Materials.json.gz");
    println!("  props <dir> [CAT]     Decode objects_*.json.gz from a directory;");
    println!("                        with CAT, list rows of that category");
}

fn cmd_info(path: &str) -> svf::Result<()> {
    let buffer = std::fs::read(path)?;
    let pack = PackFile::parse(&buffer)?;
    println!("type:    {}", pack.type_name());
    println!("version: {}", pack.version());
    println!("entries: {}", pack.num_entries());
    println!("types:");
    for ty in pack.types() {
        println!("  {} / {} (v{})", ty.type_class, ty.type_name, ty.version);
    }
    Ok(())
}

fn cmd_fragments(path: &str) -> svf::Result<()> {
    let fragments = parse_fragments_from_file(path)?;
    println!("{} fragments", fragments.len());
    for (i, f) in fragments.iter().enumerate() {
        println!(
            "  [{i}] dbId {} geometry {} material {} visible {}",
            f.db_id, f.geometry_id, f.material_id, f.visible
        );
    }
    Ok(())
}

fn cmd_geometries(path: &str) -> svf::Result<()> {
    let geometries = parse_geometry_metadata_from_file(path)?;
    println!("{} geometries", geometries.len());
    for (i, g) in geometries.iter().enumerate() {
        println!(
            "  [{i}] pack {} entity {} primitives {} fragType {}",
            g.pack_id, g.entity_id, g.primitive_count, g.fragment_type
        );
    }
    Ok(())
}

fn cmd_meshes(path: &str) -> svf::Result<()> {
    let pack = parse_mesh_pack_from_file(path)?;
    println!("{} entries ({} skipped)", pack.entries.len(), pack.skipped_entries);
    for (i, entry) in pack.entries.iter().enumerate() {
        match entry {
            Some(Mesh::Triangles(m)) => {
                println!("  [{i}] triangles: {} vertices, {} triangles", m.vertex_count, m.triangle_count)
            }
            Some(Mesh::Lines(l)) => {
                println!("  [{i}] lines: {} vertices, {} segments", l.vertex_count, l.line_count)
            }
            Some(Mesh::Points(p)) => println!("  [{i}] points: {} vertices", p.vertex_count),
            None => println!("  [{i}] <unsupported>"),
        }
    }
    Ok(())
}

fn cmd_materials(path: &str) -> svf::Result<()> {
    let decode = parse_materials_from_file(path)?;
    println!("{} materials ({} unsupported)", decode.materials.len(), decode.unsupported.len());
    for m in &decode.materials {
        println!(
            "  {} diffuse {:?} opacity {} metal {}",
            m.name,
            m.diffuse.to_array(),
            m.opacity,
            m.metal
        );
    }
    for u in &decode.unsupported {
        println!("  skipped {u}");
    }
    Ok(())
}

fn cmd_props(dir: &str, category: Option<&str>) -> svf::Result<()> {
    let db = PropDb::from_dir(dir)?;
    println!("{} nodes", db.num_nodes());

    match category {
        Some(category) => {
            let rows = db.data_by_category(category, &WalkOptions::default())?;
            println!("{} rows in category {category:?}", rows.len());
            for row in rows {
                let name = row.values.get("Name").map(|v| v.to_string()).unwrap_or_default();
                println!("  dbId {} {} {}", row.db_id, row.external_id, name);
            }
        }
        None => {
            println!("categories:");
            for (db_id, name) in db.all_categories()? {
                println!("  [{db_id}] {name}");
            }
        }
    }
    Ok(())
}
