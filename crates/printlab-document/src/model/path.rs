//! Path layer payload: an SVG path data string backed by lyon.
//!
//! The persisted form is the path data itself; the lyon path is rebuilt on
//! demand for bounds queries and rasterization. Coordinates in the data are
//! local to the layer origin.

use lyon::algorithms::aabb::bounding_box;
use lyon::math::point;
use lyon::path::Path;
use serde::{Deserialize, Serialize};

use printlab_core::geometry::Point;

/// A free-form path described by SVG path data (`M`, `L`, `C`, `Q`, `Z`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathLayer {
    pub data: String,
}

impl PathLayer {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }

    /// Builds a closed or open polyline path from vertices.
    pub fn from_points(points: &[Point], closed: bool) -> Self {
        let mut data = String::new();
        for (i, p) in points.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            data.push_str(&format!("{} {} {} ", cmd, p.x, p.y));
        }
        if closed {
            data.push('Z');
        }
        Self {
            data: data.trim_end().to_string(),
        }
    }

    /// Intrinsic size from the path's axis-aligned bounding box.
    pub fn intrinsic_size(&self) -> (f64, f64) {
        match self.to_lyon_path() {
            Some(path) => {
                let aabb = bounding_box(path.iter());
                (
                    (aabb.max.x - aabb.min.x).max(0.0) as f64,
                    (aabb.max.y - aabb.min.y).max(0.0) as f64,
                )
            }
            None => (0.0, 0.0),
        }
    }

    /// Parses the stored data into a lyon path.
    ///
    /// Returns `None` when the data contains no usable commands. Unsupported
    /// commands (`A`, `S`, `T`) terminate their token run but do not fail
    /// the whole path.
    pub fn to_lyon_path(&self) -> Option<Path> {
        let tokens = tokenize(&self.data);
        if tokens.is_empty() {
            return None;
        }

        let mut builder = Path::builder();
        let mut cur = (0.0f32, 0.0f32);
        let mut start = cur;
        let mut open = false;
        let mut i = 0;

        while i < tokens.len() {
            let cmd = tokens[i].clone();
            i += 1;
            let relative = cmd.chars().next().is_some_and(|c| c.is_lowercase());
            match cmd.to_ascii_uppercase().as_str() {
                "M" => {
                    let (x, y) = (take(&tokens, &mut i)?, take(&tokens, &mut i)?);
                    if open {
                        builder.end(false);
                    }
                    cur = if relative {
                        (cur.0 + x, cur.1 + y)
                    } else {
                        (x, y)
                    };
                    start = cur;
                    builder.begin(point(cur.0, cur.1));
                    open = true;
                }
                "L" => {
                    while let (Some(x), Some(y)) = (peek_num(&tokens, i), peek_num(&tokens, i + 1))
                    {
                        i += 2;
                        if !open {
                            builder.begin(point(cur.0, cur.1));
                            start = cur;
                            open = true;
                        }
                        cur = if relative {
                            (cur.0 + x, cur.1 + y)
                        } else {
                            (x, y)
                        };
                        builder.line_to(point(cur.0, cur.1));
                    }
                }
                "H" => {
                    let x = take(&tokens, &mut i)?;
                    if !open {
                        builder.begin(point(cur.0, cur.1));
                        start = cur;
                        open = true;
                    }
                    cur.0 = if relative { cur.0 + x } else { x };
                    builder.line_to(point(cur.0, cur.1));
                }
                "V" => {
                    let y = take(&tokens, &mut i)?;
                    if !open {
                        builder.begin(point(cur.0, cur.1));
                        start = cur;
                        open = true;
                    }
                    cur.1 = if relative { cur.1 + y } else { y };
                    builder.line_to(point(cur.0, cur.1));
                }
                "Q" => {
                    while peek_num(&tokens, i + 3).is_some() && peek_num(&tokens, i).is_some() {
                        if !open {
                            builder.begin(point(cur.0, cur.1));
                            start = cur;
                            open = true;
                        }
                        let cx = take(&tokens, &mut i)?;
                        let cy = take(&tokens, &mut i)?;
                        let x = take(&tokens, &mut i)?;
                        let y = take(&tokens, &mut i)?;
                        let (cx, cy, x, y) = if relative {
                            (cur.0 + cx, cur.1 + cy, cur.0 + x, cur.1 + y)
                        } else {
                            (cx, cy, x, y)
                        };
                        builder.quadratic_bezier_to(point(cx, cy), point(x, y));
                        cur = (x, y);
                    }
                }
                "C" => {
                    while peek_num(&tokens, i + 5).is_some() && peek_num(&tokens, i).is_some() {
                        if !open {
                            builder.begin(point(cur.0, cur.1));
                            start = cur;
                            open = true;
                        }
                        let c1x = take(&tokens, &mut i)?;
                        let c1y = take(&tokens, &mut i)?;
                        let c2x = take(&tokens, &mut i)?;
                        let c2y = take(&tokens, &mut i)?;
                        let x = take(&tokens, &mut i)?;
                        let y = take(&tokens, &mut i)?;
                        let (c1x, c1y, c2x, c2y, x, y) = if relative {
                            (
                                cur.0 + c1x,
                                cur.1 + c1y,
                                cur.0 + c2x,
                                cur.1 + c2y,
                                cur.0 + x,
                                cur.1 + y,
                            )
                        } else {
                            (c1x, c1y, c2x, c2y, x, y)
                        };
                        builder.cubic_bezier_to(point(c1x, c1y), point(c2x, c2y), point(x, y));
                        cur = (x, y);
                    }
                }
                "Z" => {
                    if open {
                        builder.close();
                        open = false;
                    }
                    cur = start;
                }
                _ => {
                    // Skip tokens until the next command letter
                    while peek_num(&tokens, i).is_some() {
                        i += 1;
                    }
                }
            }
        }
        if open {
            builder.end(false);
        }
        let path = builder.build();
        if path.iter().next().is_none() {
            None
        } else {
            Some(path)
        }
    }
}

fn peek_num(tokens: &[String], i: usize) -> Option<f32> {
    tokens.get(i)?.parse::<f32>().ok()
}

fn take(tokens: &[String], i: &mut usize) -> Option<f32> {
    let v = tokens.get(*i)?.parse::<f32>().ok()?;
    *i += 1;
    Some(v)
}

fn tokenize(data: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in data.chars() {
        match ch {
            'M' | 'm' | 'L' | 'l' | 'H' | 'h' | 'V' | 'v' | 'C' | 'c' | 'S' | 's' | 'Q' | 'q'
            | 'T' | 't' | 'A' | 'a' | 'Z' | 'z' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(ch.to_string());
            }
            ' ' | ',' | '\n' | '\r' | '\t' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
