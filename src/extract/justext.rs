//! Boilerplate classifier in the style of jusText.
//!
//! The page body is cut into text blocks at block-level elements. Each block
//! gets a context-free class from its length, link density and stop-word
//! density, then short and near-good blocks are revised by looking at their
//! nearest confidently classified neighbours.

use crate::extract::BoilerplateClassifier;
use crate::extract::markup::collapse_whitespace;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

const LENGTH_LOW: usize = 70;
const LENGTH_HIGH: usize = 200;
const STOPWORDS_LOW: f64 = 0.30;
const STOPWORDS_HIGH: f64 = 0.32;
const MAX_LINK_DENSITY: f64 = 0.2;

/// Elements that start and end a text block.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "center", "dd", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th",
    "tr", "ul",
];

/// Elements whose content never reaches the reader.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "iframe", "head", "button", "select",
];

static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

const ENGLISH_STOPWORDS: &str = include_str!("stoplists/english.txt");

/// One classified text block, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub text: String,
    pub is_boilerplate: bool,
}

/// Lower-case stop words for one language.
#[derive(Debug, Clone)]
pub struct Stoplist {
    words: HashSet<String>,
}

impl Stoplist {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    pub fn english() -> Self {
        Self::new(ENGLISH_STOPWORDS.lines())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Share of `text`'s words that are stop words.
    pub fn density(&self, text: &str) -> f64 {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();
        if words.is_empty() {
            return 0.0;
        }
        let hits = words.iter().filter(|w| self.contains(w)).count();
        hits as f64 / words.len() as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Good,
    NearGood,
    Short,
    Bad,
}

#[derive(Debug)]
struct RawBlock {
    text: String,
    link_chars: usize,
}

impl RawBlock {
    fn link_density(&self) -> f64 {
        let len = self.text.chars().count();
        if len == 0 {
            0.0
        } else {
            self.link_chars as f64 / len as f64
        }
    }
}

/// Collects text blocks while walking the DOM.
#[derive(Default)]
struct Segmenter {
    blocks: Vec<RawBlock>,
    text: String,
    link_chars: usize,
}

impl Segmenter {
    fn walk(&mut self, element: ElementRef<'_>, in_link: bool) {
        let name = element.value().name();
        if SKIPPED_TAGS.contains(&name) {
            return;
        }
        let is_block = BLOCK_TAGS.contains(&name);
        if is_block {
            self.flush();
        }
        if name == "br" {
            self.text.push(' ');
        }

        let in_link = in_link || name == "a";
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                self.push_text(text, in_link);
            } else if let Some(child) = ElementRef::wrap(child) {
                self.walk(child, in_link);
            }
        }

        if is_block {
            self.flush();
        }
    }

    fn push_text(&mut self, text: &str, in_link: bool) {
        if in_link {
            self.link_chars += collapse_whitespace(text).chars().count();
        }
        self.text.push_str(text);
    }

    fn flush(&mut self) {
        let text = collapse_whitespace(&self.text);
        if !text.is_empty() {
            self.blocks.push(RawBlock {
                text,
                link_chars: self.link_chars,
            });
        }
        self.text.clear();
        self.link_chars = 0;
    }
}

fn segment(html: &str) -> Vec<RawBlock> {
    let document = Html::parse_document(html);
    let mut segmenter = Segmenter::default();
    let root = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());
    segmenter.walk(root, false);
    segmenter.flush();
    segmenter.blocks
}

fn context_free_class(block: &RawBlock, stoplist: &Stoplist) -> Class {
    let length = block.text.chars().count();
    let link_density = block.link_density();

    if link_density > MAX_LINK_DENSITY {
        return Class::Bad;
    }
    if block.text.contains('\u{a9}') || block.text.contains("&copy") {
        return Class::Bad;
    }
    if length < LENGTH_LOW {
        return if link_density > 0.0 {
            Class::Bad
        } else {
            Class::Short
        };
    }

    let stopword_density = stoplist.density(&block.text);
    if stopword_density >= STOPWORDS_HIGH {
        if length > LENGTH_HIGH {
            Class::Good
        } else {
            Class::NearGood
        }
    } else if stopword_density >= STOPWORDS_LOW {
        Class::NearGood
    } else {
        Class::Bad
    }
}

/// Nearest neighbour class, skipping short blocks (and near-good ones when
/// `ignore_neargood`). The document edges count as bad.
fn neighbour<I>(classes: &[Class], indices: I, ignore_neargood: bool) -> Class
where
    I: Iterator<Item = usize>,
{
    indices
        .map(|i| classes[i])
        .find(|c| match c {
            Class::Good | Class::Bad => true,
            Class::NearGood => !ignore_neargood,
            Class::Short => false,
        })
        .unwrap_or(Class::Bad)
}

fn prev_neighbour(classes: &[Class], i: usize, ignore_neargood: bool) -> Class {
    neighbour(classes, (0..i).rev(), ignore_neargood)
}

fn next_neighbour(classes: &[Class], i: usize, ignore_neargood: bool) -> Class {
    neighbour(classes, i + 1..classes.len(), ignore_neargood)
}

fn revise(initial: &[Class]) -> Vec<Class> {
    let mut classes = initial.to_vec();

    for i in 0..classes.len() {
        if initial[i] != Class::Short {
            continue;
        }
        let prev = prev_neighbour(initial, i, true);
        let next = next_neighbour(initial, i, true);
        classes[i] = match (prev, next) {
            (Class::Good, Class::Good) => Class::Good,
            (Class::Bad, Class::Bad) => Class::Bad,
            _ => {
                let bad_then_neargood_before =
                    prev == Class::Bad && prev_neighbour(initial, i, false) == Class::NearGood;
                let bad_then_neargood_after =
                    next == Class::Bad && next_neighbour(initial, i, false) == Class::NearGood;
                if bad_then_neargood_before || bad_then_neargood_after {
                    Class::Good
                } else {
                    Class::Bad
                }
            }
        };
    }

    let after_short = classes.clone();
    for i in 0..classes.len() {
        if after_short[i] != Class::NearGood {
            continue;
        }
        let prev = prev_neighbour(&after_short, i, true);
        let next = next_neighbour(&after_short, i, true);
        classes[i] = if prev == Class::Bad && next == Class::Bad {
            Class::Bad
        } else {
            Class::Good
        };
    }

    classes
}

/// Classify the blocks of an HTML page against `stoplist`.
pub fn classify_html(html: &str, stoplist: &Stoplist) -> Vec<TextBlock> {
    let blocks = segment(html);
    let initial: Vec<Class> = blocks
        .iter()
        .map(|b| context_free_class(b, stoplist))
        .collect();
    let revised = revise(&initial);

    blocks
        .into_iter()
        .zip(revised)
        .map(|(block, class)| TextBlock {
            text: block.text,
            is_boilerplate: class != Class::Good,
        })
        .collect()
}

/// [`BoilerplateClassifier`] using the jusText heuristics.
#[derive(Debug, Clone, Copy, Default)]
pub struct JustextClassifier;

impl BoilerplateClassifier for JustextClassifier {
    fn classify(&self, page: &[u8], stoplist: &Stoplist) -> Vec<TextBlock> {
        classify_html(&String::from_utf8_lossy(page), stoplist)
    }
}
