// https://github.com/softprops/treeline/blob/eaaa03a5fac200fb5255c8aa927de43e7974745f/src/lib.rs
// Original work Copyright (c) 2015-2016 Doug Tangren
// Modified work Copyright (c) 2019 Cole Helbling
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use std::fmt;
use std::fmt::Display;

use termion::color;
use termion::style;

use crate::store::Index;

const EDGE: &str = "├── ";
const LINE: &str = "│   ";
const CORNER: &str = "└── ";
const BLANK: &str = "    ";

/// Builds the tree below `prefix` by expanding folder listings of `index`.
pub fn tree<S>(index: &Index, prefix: &[S]) -> Tree
where
    S: AsRef<str>,
{
    let prefix = prefix
        .iter()
        .map(|segment| segment.as_ref().to_owned())
        .collect::<Vec<_>>();
    let name = prefix
        .last()
        .cloned()
        .unwrap_or_else(|| String::from("Password Store"));

    Tree {
        name,
        is_dir: true,
        tree: branch(index, prefix),
    }
}

fn branch(index: &Index, prefix: Vec<String>) -> Vec<Tree> {
    let listing = index.list_folder(&prefix[..]);

    listing
        .items()
        .map(|(name, is_dir)| {
            let tree = if is_dir {
                let mut path = prefix.clone();
                path.push(name.to_owned());
                branch(index, path)
            } else {
                Vec::new()
            };

            Tree {
                name: name.to_owned(),
                is_dir,
                tree,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    pub name: String,
    pub is_dir: bool,
    pub tree: Vec<Tree>,
}

impl Tree {
    /// Canonical names of every file leaf, depth first.
    pub fn leaves(&self) -> Vec<String> {
        fn walk(leaves: &[Tree], prefix: &str, out: &mut Vec<String>) {
            for leaf in leaves {
                let name = if prefix.is_empty() {
                    leaf.name.clone()
                } else {
                    format!("{}/{}", prefix, leaf.name)
                };

                if leaf.is_dir {
                    walk(&leaf.tree, &name, out);
                } else {
                    out.push(name);
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.tree, "", &mut out);
        out
    }

    fn draw_tree(f: &mut fmt::Formatter, leaves: &[Tree], prefix: Vec<bool>) -> fmt::Result {
        for (i, leaf) in leaves.iter().enumerate() {
            let last = i >= leaves.len() - 1;
            let mut prefix = prefix.clone();

            for s in &prefix {
                if *s {
                    write!(f, "{}", BLANK)?;
                } else {
                    write!(f, "{}", LINE)?;
                }
            }

            let connector = if last { CORNER } else { EDGE };
            if leaf.is_dir {
                writeln!(
                    f,
                    "{}{blue}{bold}{}{reset}",
                    connector,
                    leaf.name,
                    bold = style::Bold,
                    blue = color::Fg(color::Blue),
                    reset = style::Reset
                )?;
            } else {
                writeln!(f, "{}{}", connector, leaf.name)?;
            }

            if !leaf.tree.is_empty() {
                prefix.push(last);
                Self::draw_tree(f, &leaf.tree, prefix)?;
            }
        }
        write!(f, "")
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{bold}{blue}{}{reset}",
            self.name,
            bold = style::Bold,
            blue = color::Fg(color::Blue),
            reset = style::Reset
        )?;

        Self::draw_tree(f, &self.tree, Vec::new())
    }
}
