// src/discovery.rs

//! Locating the asset on disk
//!
//! Users point the tool at either the master file itself or the game folder.
//! Folders are searched in a fixed order; the first hit wins.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the asset inside a game installation
pub const ASSET_FILE_NAME: &str = "Fallout4.esm";

/// Relative locations tried inside a game folder, in order
const FOLDER_CANDIDATES: &[&[&str]] = &[
    &[ASSET_FILE_NAME],
    &["Data", ASSET_FILE_NAME],
    &["data", ASSET_FILE_NAME],
];

/// Installation folders of the Windows Steam and GOG releases
const WINDOWS_INSTALLS: &[&str] = &[
    r"C:\Program Files (x86)\Steam\steamapps\common\Fallout 4",
    r"C:\Program Files (x86)\Steam\steamapps\common\Fallout 4 VR",
    r"C:\Games\Fallout 4",
    r"C:\Games\Fallout 4 VR",
    r"D:\Steam\steamapps\common\Fallout 4",
    r"D:\Steam\steamapps\common\Fallout 4 VR",
    r"D:\SteamLibrary\steamapps\common\Fallout 4",
    r"D:\SteamLibrary\steamapps\common\Fallout 4 VR",
    r"C:\GOG Games\Fallout 4",
    r"C:\Program Files (x86)\GOG Galaxy\Games\Fallout 4",
];

/// Find the asset inside a game folder
pub fn locate_in_folder(folder: &Path) -> Option<PathBuf> {
    FOLDER_CANDIDATES
        .iter()
        .map(|parts| parts.iter().fold(folder.to_path_buf(), |p, part| p.join(part)))
        .find(|candidate| candidate.is_file())
}

/// Turn user input into an asset path
///
/// An existing file with an `.esm` extension (any case) is used as is. A
/// directory is searched with [`locate_in_folder`].
pub fn resolve_input(input: &Path) -> Result<PathBuf> {
    if input.is_file() {
        return if has_esm_extension(input) {
            Ok(input.to_path_buf())
        } else {
            Err(Error::UnsupportedInput(input.to_path_buf()))
        };
    }

    if input.is_dir() {
        return match locate_in_folder(input) {
            Some(found) => {
                debug!("Found {} at {}", ASSET_FILE_NAME, found.display());
                Ok(found)
            }
            None => Err(Error::NotFound(input.join(ASSET_FILE_NAME))),
        };
    }

    Err(Error::NotFound(input.to_path_buf()))
}

fn has_esm_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("esm"))
}

/// Folders where the game is commonly installed on this platform
pub fn well_known_installs() -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = if cfg!(windows) {
        WINDOWS_INSTALLS.iter().map(PathBuf::from).collect()
    } else {
        Vec::new()
    };

    if !cfg!(windows) {
        let libraries = [
            dirs::home_dir().map(|h| h.join(".steam").join("steam")),
            dirs::data_dir().map(|d| d.join("Steam")),
        ];
        for library in libraries.into_iter().flatten() {
            let common = library.join("steamapps").join("common");
            roots.push(common.join("Fallout 4"));
            roots.push(common.join("Fallout 4 VR"));
        }
    }

    roots
}

/// Every asset found at the root or `Data` folder of `roots`
///
/// Paths are deduplicated after canonicalization, so a Steam library reached
/// through a symlink is reported once.
pub fn scan_installs(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for root in roots {
        for candidate in [root.join(ASSET_FILE_NAME), root.join("Data").join(ASSET_FILE_NAME)] {
            if !candidate.is_file() {
                continue;
            }
            let key = candidate.canonicalize().unwrap_or_else(|_| candidate.clone());
            if seen.insert(key) {
                debug!("Found installation: {}", candidate.display());
                found.push(candidate);
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_root_takes_precedence_over_data() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("Data")).unwrap();
        fs::write(temp.path().join("Data").join(ASSET_FILE_NAME), b"data").unwrap();

        assert_eq!(
            locate_in_folder(temp.path()),
            Some(temp.path().join("Data").join(ASSET_FILE_NAME))
        );

        fs::write(temp.path().join(ASSET_FILE_NAME), b"root").unwrap();
        assert_eq!(
            locate_in_folder(temp.path()),
            Some(temp.path().join(ASSET_FILE_NAME))
        );
    }

    #[test]
    fn test_lowercase_data_folder() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("data")).unwrap();
        fs::write(temp.path().join("data").join(ASSET_FILE_NAME), b"x").unwrap();

        let resolved = resolve_input(temp.path()).unwrap();
        assert!(resolved.ends_with(Path::new("data").join(ASSET_FILE_NAME)));
    }

    #[test]
    fn test_resolve_input_file() {
        let temp = TempDir::new().unwrap();
        let upper = temp.path().join("Fallout4.ESM");
        fs::write(&upper, b"x").unwrap();
        assert_eq!(resolve_input(&upper).unwrap(), upper);

        let other = temp.path().join("Fallout4.esp");
        fs::write(&other, b"x").unwrap();
        assert!(matches!(
            resolve_input(&other),
            Err(Error::UnsupportedInput(_))
        ));
    }

    #[test]
    fn test_resolve_input_missing() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            resolve_input(temp.path()),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            resolve_input(&temp.path().join("nowhere")),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_scan_installs() {
        let temp = TempDir::new().unwrap();
        let game = temp.path().join("Fallout 4");
        let vr = temp.path().join("Fallout 4 VR");
        fs::create_dir_all(game.join("Data")).unwrap();
        fs::create_dir_all(&vr).unwrap();
        fs::write(game.join("Data").join(ASSET_FILE_NAME), b"x").unwrap();
        fs::write(vr.join(ASSET_FILE_NAME), b"x").unwrap();

        let roots = vec![
            game.clone(),
            vr.clone(),
            game.clone(),
            temp.path().join("absent"),
        ];
        assert_eq!(
            scan_installs(&roots),
            vec![
                game.join("Data").join(ASSET_FILE_NAME),
                vr.join(ASSET_FILE_NAME)
            ]
        );
    }

    #[test]
    #[cfg(windows)]
    fn test_well_known_installs_include_steam_default() {
        let roots = well_known_installs();
        assert!(roots.contains(&PathBuf::from(
            r"C:\Program Files (x86)\Steam\steamapps\common\Fallout 4"
        )));
        assert_eq!(roots.len(), WINDOWS_INSTALLS.len());
    }

    #[test]
    #[cfg(not(windows))]
    fn test_well_known_installs_include_steam_default() {
        let roots = well_known_installs();
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let common = home
            .join(".steam")
            .join("steam")
            .join("steamapps")
            .join("common");
        assert!(roots.contains(&common.join("Fallout 4")), "{:?}", roots);
        assert!(roots.contains(&common.join("Fallout 4 VR")), "{:?}", roots);
        assert!(roots.iter().all(|r| !r.starts_with("C:")));
    }
}
