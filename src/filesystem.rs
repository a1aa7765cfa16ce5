//! Path helpers and extension based asset classification.
//!
//! Paths are handled as plain strings that may use either `/` or `\` as a
//! separator, since asset paths are stored in scene files written on any
//! platform. Missing directories produce empty listings instead of errors.

use std::{fs, path::Path};

const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".png", ".bmp", ".tga", ".dds", ".exr", ".raw", ".gif", ".hdr", ".ico", ".iff",
    ".jng", ".jpeg", ".koala", ".kodak", ".mng", ".pcx", ".pbm", ".pgm", ".ppm", ".pfm", ".pict",
    ".psd", ".sgi", ".targa", ".tiff", ".wbmp", ".webp", ".xbm", ".xpm",
];
const SCRIPT_EXTENSIONS: &[&str] = &[".as"];
const SCENE_EXTENSIONS: &[&str] = &[".dss"];
const MODEL_EXTENSIONS: &[&str] = &[
    ".3ds", ".obj", ".fbx", ".blend", ".dae", ".lwo", ".c4d", ".ase", ".dxf", ".hmp", ".md2",
    ".md3", ".md5", ".mdc", ".mdl", ".nff", ".ply", ".stl", ".x", ".smd", ".lxo", ".lws", ".ter",
    ".ac3d", ".ms3d", ".cob", ".q3bsp", ".xgl", ".csm", ".bvh", ".b3d", ".ndo",
];
const SHADER_EXTENSIONS: &[&str] = &[".hlsl", ".wgsl"];

/// Folder every relative asset path is anchored on.
pub const ASSETS_FOLDER: &str = "Assets";

pub fn file_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().exists()
}

/// `Assets/Models/cube.obj` -> `cube.obj`
pub fn get_file_name_from_path(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// `Assets/Models/cube.obj` -> `cube`
pub fn get_file_name_no_extension_from_path(path: &str) -> &str {
    let file_name = get_file_name_from_path(path);
    match file_name.rfind('.') {
        Some(idx) => &file_name[..idx],
        None => file_name,
    }
}

/// `Assets/Models/cube.obj` -> `Assets/Models/` (separator kept)
pub fn get_path_without_file_name(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(idx) => &path[..=idx],
        None => "",
    }
}

/// Extension including the dot, or an empty string when there is none.
pub fn get_extension_from_path(path: &str) -> &str {
    let file_name = get_file_name_from_path(path);
    match file_name.rfind('.') {
        Some(idx) => &file_name[idx..],
        None => "",
    }
}

/// Strips everything before the [`ASSETS_FOLDER`].
///
/// `D:\Projects\Build\Assets\Models\tex.jpg` -> `Assets\Models\tex.jpg`. Paths
/// outside of the assets folder are returned unchanged.
pub fn get_relative_path_from_absolute_path(absolute_path: &str) -> &str {
    match absolute_path.find(ASSETS_FOLDER) {
        Some(idx) => &absolute_path[idx..],
        None => {
            log::warn!(
                "{} is not inside the {} folder",
                absolute_path,
                ASSETS_FOLDER
            );
            absolute_path
        }
    }
}

/// Names of the sub directories of `directory`, sorted.
pub fn get_folders_in_directory(directory: impl AsRef<Path>) -> Vec<String> {
    let mut folders: Vec<String> = read_dir_entries(directory.as_ref())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    folders.sort();
    folders
}

/// Paths of the files in `directory` (not recursive), sorted.
pub fn get_files_in_directory(directory: impl AsRef<Path>) -> Vec<String> {
    let mut files: Vec<String> = read_dir_entries(directory.as_ref())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.path().to_string_lossy().into_owned())
        .collect();
    files.sort();
    files
}

fn read_dir_entries(directory: &Path) -> impl Iterator<Item = fs::DirEntry> {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => Some(entries),
        Err(e) => {
            log::trace!("Can't list {}: {}", directory.display(), e);
            None
        }
    };
    entries.into_iter().flatten().filter_map(Result::ok)
}

/// Images, then scripts, then models found in `directory`.
pub fn get_supported_files_in_directory(directory: impl AsRef<Path>) -> Vec<String> {
    let files = get_files_in_directory(directory);
    let mut supported = get_images_from_paths(&files);
    supported.extend(get_scripts_from_paths(&files));
    supported.extend(get_models_from_paths(&files));
    supported
}

pub fn get_images_from_paths(paths: &[String]) -> Vec<String> {
    filter_paths(paths, is_supported_image)
}

pub fn get_scripts_from_paths(paths: &[String]) -> Vec<String> {
    filter_paths(paths, is_supported_script)
}

pub fn get_models_from_paths(paths: &[String]) -> Vec<String> {
    filter_paths(paths, is_supported_model)
}

fn filter_paths(paths: &[String], predicate: fn(&str) -> bool) -> Vec<String> {
    paths.iter().filter(|p| predicate(p)).cloned().collect()
}

pub fn is_supported_image(path: &str) -> bool {
    has_extension(path, IMAGE_EXTENSIONS)
}

pub fn is_supported_script(path: &str) -> bool {
    has_extension(path, SCRIPT_EXTENSIONS)
}

pub fn is_supported_scene(path: &str) -> bool {
    has_extension(path, SCENE_EXTENSIONS)
}

pub fn is_supported_model(path: &str) -> bool {
    has_extension(path, MODEL_EXTENSIONS)
}

pub fn is_supported_shader(path: &str) -> bool {
    has_extension(path, SHADER_EXTENSIONS)
}

fn has_extension(path: &str, table: &[&str]) -> bool {
    let extension = get_extension_from_path(path);
    !extension.is_empty()
        && table
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(extension))
}

pub fn convert_to_uppercase(lower: &str) -> String {
    lower.to_uppercase()
}
