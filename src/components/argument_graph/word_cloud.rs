//! Rasterizes a weighted word list into a static image.
//!
//! Words are packed greedily into lines whose budget is measured in
//! characters, then painted centered on a bordered white card with a
//! backing color that encodes the sign and magnitude of each weight.

use serde::{Deserialize, Serialize};

use super::error::PreloadError;
use super::geometry::{Point, Rect, Size};
use super::surface::{Surface, TextMeasure};

/// Side length of the square the canvas area is derived from.
pub const RESOLUTION: f64 = 1000.0;
pub const DEFAULT_ASPECT_RATIO: f64 = 5.0;
const LINE_BUDGET_FACTOR: f64 = 1.5;
const BORDER_WIDTH: f64 = 5.0;

/// A word and its signed contribution, `[word, weight]` on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, f64)", into = "(String, f64)")]
pub struct WeightedWord {
	pub text: String,
	pub weight: f64,
}

impl WeightedWord {
	pub fn new(text: impl Into<String>, weight: f64) -> Self {
		Self {
			text: text.into(),
			weight,
		}
	}

	fn len(&self) -> usize {
		self.text.chars().count()
	}
}

impl From<(String, f64)> for WeightedWord {
	fn from((text, weight): (String, f64)) -> Self {
		Self { text, weight }
	}
}

impl From<WeightedWord> for (String, f64) {
	fn from(word: WeightedWord) -> Self {
		(word.text, word.weight)
	}
}

/// Green for positive weights, red for negative, alpha from magnitude.
pub fn word_color(weight: f64) -> String {
	if weight > 0.0 {
		format!("rgba(0, 255, 0, {})", weight.min(1.0))
	} else if weight < 0.0 {
		format!("rgba(255, 0, 0, {})", weight.abs().min(1.0))
	} else {
		"white".to_owned()
	}
}

/// Canvas size, font, and line assignment of a word cloud. Lines hold
/// indices into the word list.
#[derive(Clone, Debug, PartialEq)]
pub struct WordCloudLayout {
	pub size: Size,
	pub font_px: f64,
	pub lines: Vec<Vec<usize>>,
}

impl WordCloudLayout {
	pub fn new(words: &[WeightedWord], aspect_ratio: f64) -> Self {
		let aspect_ratio = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
			aspect_ratio
		} else {
			DEFAULT_ASPECT_RATIO
		};
		let letters = words.iter().map(|w| w.len() + 1).sum::<usize>().max(1) as f64;
		let area = RESOLUTION * RESOLUTION;

		Self {
			size: Size::new((area * aspect_ratio).sqrt(), (area / aspect_ratio).sqrt()),
			font_px: RESOLUTION / letters.sqrt(),
			lines: pack_lines(words, (aspect_ratio * letters).sqrt() * LINE_BUDGET_FACTOR),
		}
	}

	fn line_gap(&self) -> f64 {
		self.font_px / 6.0
	}

	fn word_gap(&self) -> f64 {
		self.font_px / 3.0
	}

	fn line_height(&self) -> f64 {
		self.font_px * 1.2
	}
}

/// Greedy running-width packing. A word joins the current line while the
/// line stays under budget; an over-long word gets a line of its own.
fn pack_lines(words: &[WeightedWord], budget: f64) -> Vec<Vec<usize>> {
	let mut lines = Vec::new();
	let mut current = Vec::new();
	let mut width = 0.0;

	for (i, word) in words.iter().enumerate() {
		let w = word.len() as f64;
		if width + w < budget || current.is_empty() {
			current.push(i);
			width += w;
		} else {
			lines.push(std::mem::take(&mut current));
			current.push(i);
			width = w;
		}
	}
	if !current.is_empty() {
		lines.push(current);
	}
	lines
}

pub fn paint<S: Surface + ?Sized>(
	layout: &WordCloudLayout,
	words: &[WeightedWord],
	surface: &mut S,
	measure: &dyn TextMeasure,
) {
	let Size { width, height } = layout.size;
	surface.resize(layout.size);

	let card = Rect::new(0.0, 0.0, width, height);
	surface.set_fill_style("white");
	surface.fill_rect(card);
	surface.set_stroke_style("black");
	surface.set_line_width(BORDER_WIDTH);
	surface.stroke_rect(card);

	surface.set_font(layout.font_px);
	let rows = layout.lines.len() as f64;
	let block = rows * layout.line_height() + (rows - 1.0).max(0.0) * layout.line_gap();
	let mut y = (height - block) / 2.0;

	for line in &layout.lines {
		let widths: Vec<f64> = line
			.iter()
			.map(|&i| measure.text_width(&words[i].text, layout.font_px))
			.collect();
		let gaps = (line.len().saturating_sub(1)) as f64 * layout.word_gap();
		let mut x = (width - widths.iter().sum::<f64>() - gaps) / 2.0;

		for (&i, w) in line.iter().zip(&widths) {
			let word = &words[i];
			surface.set_fill_style(&word_color(word.weight));
			surface.fill_rect(Rect::new(x, y, *w, layout.line_height()));
			surface.set_fill_style("black");
			surface.fill_text(&word.text, Point::new(x, y + layout.line_height() / 2.0));
			x += w + layout.word_gap();
		}
		y += layout.line_height() + layout.line_gap();
	}
}

/// Lays out and paints `words` onto `surface`, returning the result as a data URI.
pub fn rasterize<S: Surface + ?Sized>(
	words: &[WeightedWord],
	aspect_ratio: f64,
	surface: &mut S,
	measure: &dyn TextMeasure,
) -> Result<String, PreloadError> {
	let layout = WordCloudLayout::new(words, aspect_ratio);
	paint(&layout, words, surface, measure);
	surface
		.to_data_url()
		.map_err(|err| PreloadError::WordCloud(err.to_string()))
}
