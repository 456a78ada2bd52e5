use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use log::info;
use thiserror::Error;

use crate::assignment::Assignment;
use crate::grid_config::{Cell, GridConfig};

/// Character used for blocked cells in rendered output.
pub const BLOCK: char = '█';

/// Size in pixels of one grid cell in image output, including its border.
pub const CELL_SIZE: u32 = 100;

/// Width of the black border drawn around each open cell.
pub const CELL_BORDER: u32 = 2;

const INTERIOR_SIZE: u32 = CELL_SIZE - 2 * CELL_BORDER;

/// Letter bitmaps are 8x8; each bitmap pixel becomes a square this many pixels wide.
const GLYPH_SCALE: u32 = 8;

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unable to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to save image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// How a filled grid gets written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Png,
}

impl OutputFormat {
    /// Pick a format from the file extension: `.png` (in any case) gets an image, anything else
    /// gets the text grid.
    pub fn from_path(path: &Path) -> OutputFormat {
        match path.extension().and_then(OsStr::to_str) {
            Some(extension) if extension.eq_ignore_ascii_case("png") => OutputFormat::Png,
            _ => OutputFormat::Text,
        }
    }
}

/// The letter showing in each cell: the assigned word's glyph if its slot is filled, otherwise
/// the letter given in the template, if any.
fn letter_grid(config: &GridConfig, assignment: &Assignment) -> Vec<Vec<Option<char>>> {
    let mut letters: Vec<Vec<Option<char>>> = (0..config.height)
        .map(|row| {
            (0..config.width)
                .map(|col| match config.cell(row, col) {
                    Cell::Open(glyph) => glyph,
                    Cell::Blocked => None,
                })
                .collect()
        })
        .collect();

    for (slot_id, word_id) in assignment.iter() {
        let word = &config.vocabulary().words[word_id];
        for ((row, col), &glyph) in config.slot(slot_id).cell_coords().zip(&word.glyphs) {
            letters[row][col] = Some(glyph);
        }
    }

    letters
}

/// Turn the given grid config and assignment into a rendered string. Open cells with no letter
/// yet are left blank; letters given in the template are shown even if their slots are unassigned.
pub fn render_grid(config: &GridConfig, assignment: &Assignment) -> String {
    letter_grid(config, assignment)
        .iter()
        .enumerate()
        .map(|(row, row_letters)| {
            row_letters
                .iter()
                .enumerate()
                .map(|(col, letter)| match config.cell(row, col) {
                    Cell::Blocked => BLOCK,
                    Cell::Open(_) => letter.unwrap_or(' '),
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn glyph_bitmap(glyph: char) -> Option<[u8; 8]> {
    BASIC_FONTS.get(glyph).or_else(|| LATIN_FONTS.get(glyph))
}

/// Draw the grid as an image: a black canvas with a white square for each open cell and its
/// letter, if it has one, centered in black.
pub fn render_image(config: &GridConfig, assignment: &Assignment) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(
        config.width as u32 * CELL_SIZE,
        config.height as u32 * CELL_SIZE,
        BLACK,
    );
    let glyph_offset = (INTERIOR_SIZE - 8 * GLYPH_SCALE) / 2;

    for (row, row_letters) in letter_grid(config, assignment).iter().enumerate() {
        for (col, letter) in row_letters.iter().enumerate() {
            if !config.cell(row, col).is_open() {
                continue;
            }

            let left = col as u32 * CELL_SIZE + CELL_BORDER;
            let top = row as u32 * CELL_SIZE + CELL_BORDER;
            draw_filled_rect_mut(
                &mut image,
                Rect::at(left as i32, top as i32).of_size(INTERIOR_SIZE, INTERIOR_SIZE),
                WHITE,
            );

            let bitmap = match letter.and_then(glyph_bitmap) {
                Some(bitmap) => bitmap,
                None => continue,
            };
            for (bitmap_row, bits) in (0u32..).zip(bitmap.iter()) {
                // Bit 0 is the leftmost pixel of the row.
                for bitmap_col in (0..8).filter(|&bit| bits & (1u8 << bit) != 0) {
                    let x = left + glyph_offset + bitmap_col * GLYPH_SCALE;
                    let y = top + glyph_offset + bitmap_row * GLYPH_SCALE;
                    draw_filled_rect_mut(
                        &mut image,
                        Rect::at(x as i32, y as i32).of_size(GLYPH_SCALE, GLYPH_SCALE),
                        BLACK,
                    );
                }
            }
        }
    }

    image
}

/// Write the grid to `path`, as an image or as text depending on its extension.
pub fn write_output<P: AsRef<Path>>(
    config: &GridConfig,
    assignment: &Assignment,
    path: P,
) -> Result<OutputFormat, RenderError> {
    let path = path.as_ref();
    let format = OutputFormat::from_path(path);

    match format {
        OutputFormat::Png => {
            render_image(config, assignment)
                .save(path)
                .map_err(|source| RenderError::Image {
                    path: path.display().to_string(),
                    source,
                })?;
        }
        OutputFormat::Text => {
            fs::write(path, render_grid(config, assignment)).map_err(|source| RenderError::Io {
                path: path.display().to_string(),
                source,
            })?;
        }
    }

    info!("Written {:?} grid to {}", format, path.display());
    Ok(format)
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::{
        render_grid, render_image, write_output, OutputFormat, RenderError, CELL_BORDER, CELL_SIZE,
    };
    use crate::assignment::Assignment;
    use crate::backtracking_search::solve;
    use crate::grid_config::GridConfig;
    use crate::word_list::WordList;

    fn solved_sample() -> (GridConfig, Assignment) {
        let config = GridConfig::from_template(
            include_str!("../data/structure0.txt"),
            WordList::parse(include_str!("../data/words0.txt")),
        )
        .unwrap();
        let assignment = solve(&config).expect("Failed to find a fill");

        (config, assignment)
    }

    fn scratch_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("xwordfill-{}-{}", std::process::id(), name))
    }

    /// Count the black pixels inside the white interior of the given cell.
    fn ink_in_cell(image: &image::RgbaImage, row: u32, col: u32) -> usize {
        let left = col * CELL_SIZE + CELL_BORDER;
        let top = row * CELL_SIZE + CELL_BORDER;
        let interior = CELL_SIZE - 2 * CELL_BORDER;

        (top..top + interior)
            .flat_map(|y| (left..left + interior).map(move |x| (x, y)))
            .filter(|&(x, y)| image.get_pixel(x, y).0 == [0, 0, 0, 255])
            .count()
    }

    #[test]
    fn test_render_solved_sample() {
        let (config, assignment) = solved_sample();

        assert_eq!(
            render_grid(&config, &assignment),
            "█SIX█\n█E██F\n█V██I\n█E██V\n█NINE"
        );
    }

    #[test]
    fn test_render_partial_assignment_keeps_prefilled_letters() {
        let config =
            GridConfig::from_template("#_#\n_a_\n#_#", WordList::new(["cat", "bad"])).unwrap();

        let mut assignment = Assignment::new(config.slot_count());
        assert_eq!(render_grid(&config, &assignment), "█ █\n A \n█ █");

        assignment.assign(0, config.vocabulary().id_of("cat").unwrap());
        assert_eq!(render_grid(&config, &assignment), "█ █\nCAT\n█ █");
    }

    #[test]
    fn test_render_image_draws_cells_and_letters() {
        let (config, assignment) = solved_sample();
        let image = render_image(&config, &assignment);

        assert_eq!(image.dimensions(), (5 * CELL_SIZE, 5 * CELL_SIZE));

        // Blocked cells stay black all the way through.
        assert_eq!(image.get_pixel(CELL_SIZE / 2, CELL_SIZE / 2).0, [0, 0, 0, 255]);

        // Open cells have a black border and a white interior around the letter.
        assert_eq!(image.get_pixel(CELL_SIZE, 0).0, [0, 0, 0, 255]);
        assert_eq!(
            image.get_pixel(CELL_SIZE + CELL_BORDER, CELL_BORDER).0,
            [255, 255, 255, 255]
        );
        assert!(ink_in_cell(&image, 0, 1) > 0);
        assert!(ink_in_cell(&image, 4, 4) > 0);
    }

    #[test]
    fn test_render_image_leaves_unfilled_cells_blank() {
        let config = GridConfig::from_template("___", WordList::new(["cat"])).unwrap();
        let image = render_image(&config, &Assignment::new(config.slot_count()));

        for col in 0..3 {
            assert_eq!(ink_in_cell(&image, 0, col), 0);
        }
    }

    #[test]
    fn test_output_format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("out.png")), OutputFormat::Png);
        assert_eq!(OutputFormat::from_path(Path::new("out.PNG")), OutputFormat::Png);
        assert_eq!(OutputFormat::from_path(Path::new("out.txt")), OutputFormat::Text);
        assert_eq!(OutputFormat::from_path(Path::new("out")), OutputFormat::Text);
        assert_eq!(OutputFormat::from_path(Path::new("png")), OutputFormat::Text);
    }

    #[test]
    fn test_write_output_text() {
        let (config, assignment) = solved_sample();
        let path = scratch_path("grid.txt");

        assert_eq!(
            write_output(&config, &assignment, &path).unwrap(),
            OutputFormat::Text
        );
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            render_grid(&config, &assignment)
        );
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_output_png() {
        let (config, assignment) = solved_sample();
        let path = scratch_path("grid.png");

        assert_eq!(
            write_output(&config, &assignment, &path).unwrap(),
            OutputFormat::Png
        );
        let written = image::open(&path).unwrap().to_rgba8();
        assert_eq!(written, render_image(&config, &assignment));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_output_reports_bad_paths() {
        let (config, assignment) = solved_sample();

        assert!(matches!(
            write_output(&config, &assignment, "/nonexistent/dir/grid.txt"),
            Err(RenderError::Io { .. })
        ));
        assert!(matches!(
            write_output(&config, &assignment, "/nonexistent/dir/grid.png"),
            Err(RenderError::Image { .. })
        ));
    }
}
