use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Finds a non-colliding output path in `directory` by probing
/// `base_name.extension`, then `"base_name (N).extension"` for N >= 1.
///
/// The probe does not create or reserve the file; the caller must write
/// promptly. Two concurrent allocators can therefore race to the same path.
/// That limitation is accepted for the single-process tool model rather than
/// papered over with locking.
pub fn allocate_unique_path(
    directory: &Path,
    base_name: &str,
    extension: &str,
) -> io::Result<PathBuf> {
    let mut counter: u32 = 0;
    loop {
        let file_name = if counter == 0 {
            format!("{base_name}.{extension}")
        } else {
            format!("{base_name} ({counter}).{extension}")
        };
        let candidate = directory.join(file_name);
        match fs::metadata(candidate.as_path()) {
            Ok(_) => counter += 1,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(candidate),
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_root(tag: &str) -> PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        let root = std::env::temp_dir().join(format!("genimage_pathing_{tag}_{stamp}"));
        fs::create_dir_all(root.as_path()).expect("temp root should exist");
        root
    }

    #[test]
    fn returns_unsuffixed_path_when_nothing_collides() {
        let root = temp_root("fresh");

        let path = allocate_unique_path(root.as_path(), "generated_image", "png")
            .expect("allocation should succeed");
        assert_eq!(path, root.join("generated_image.png"));

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn returns_suffix_n_after_n_collisions() {
        let root = temp_root("collisions");
        fs::write(root.join("img.png"), b"0").expect("collision file should be written");
        fs::write(root.join("img (1).png"), b"1").expect("collision file should be written");
        fs::write(root.join("img (2).png"), b"2").expect("collision file should be written");

        let path =
            allocate_unique_path(root.as_path(), "img", "png").expect("allocation should succeed");
        assert_eq!(path, root.join("img (3).png"));

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn unsuffixed_path_wins_even_when_suffixed_files_exist() {
        let root = temp_root("gap");
        fs::write(root.join("img (1).png"), b"1").expect("collision file should be written");

        let path =
            allocate_unique_path(root.as_path(), "img", "png").expect("allocation should succeed");
        assert_eq!(path, root.join("img.png"));

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn extension_participates_in_collision_detection() {
        let root = temp_root("ext");
        fs::write(root.join("img.png"), b"0").expect("collision file should be written");

        let path =
            allocate_unique_path(root.as_path(), "img", "jpg").expect("allocation should succeed");
        assert_eq!(path, root.join("img.jpg"));

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn missing_directory_means_first_candidate_is_free() {
        let root = temp_root("nodir").join("not_created_yet");

        let path = allocate_unique_path(root.as_path(), "img", "png")
            .expect("probe of missing directory should report not-found");
        assert_eq!(path, root.join("img.png"));
    }
}
