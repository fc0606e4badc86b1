use std::fs::File;
use std::io;
use std::io::BufRead;
use std::path::Path;

/// Reads file with given filename and returns an iterator over its lines.
/// taken from https://doc.rust-lang.org/rust-by-example/std_misc/file/read_lines.html
fn read_lines<P>(filename: P) -> io::Result<io::Lines<io::BufReader<File>>>
where
    P: AsRef<Path>,
{
    let file = File::open(filename)?;
    Ok(io::BufReader::new(file).lines())
}

/// A module containing the import and export functions for the line-oriented
/// instance format: a graph (NODE_COORD_SECTION, EDGE_SECTION) optionally
/// followed by a tree decomposition of it (BAG_COORD_SECTION,
/// BAG_EDGE_SECTION). Malformed value lines are skipped with a warning;
/// non-dense ids and dangling references are fatal.
pub mod graph_handler {
    use std::io;
    use std::path::Path;

    use log::{debug, warn};

    use crate::graph_structures::graph_model::{Cost, Graph, Pos, Vertex, VertexData};
    use crate::tree_decompositions::decomposition::Decomposition;

    /// The kinds of errors that may occur while reading an instance file:
    /// io errors, or structural defects the parser cannot recover from.
    /// Plain malformed lines are not among them, those are skipped.
    #[derive(Debug, thiserror::Error)]
    pub enum ParseError {
        #[error("io error {0}")]
        Io(#[from] io::Error),
        #[error("line {line}: expected vertex id {expected}, found {found} (vertex ids must be dense)")]
        NonDenseVertex {
            line: usize,
            expected: i64,
            found: i64,
        },
        #[error("line {line}: expected bag id {expected}, found {found} (bag ids must be dense)")]
        NonDenseBag {
            line: usize,
            expected: i64,
            found: i64,
        },
        #[error("line {line}: vertex id {id} is out of range")]
        UnknownVertex { line: usize, id: i64 },
        #[error("line {line}: bag id {id} is out of range")]
        UnknownBag { line: usize, id: i64 },
    }

    /// Import configuration. vid_start is the id the instance file counts
    /// vertices (and bags) from; it is subtracted on import to obtain the
    /// dense 0-based ids used internally.
    #[derive(Debug, Clone)]
    pub struct ImportOptions {
        pub vid_start: i64,
    }

    impl Default for ImportOptions {
        fn default() -> ImportOptions {
            ImportOptions { vid_start: 0 }
        }
    }

    /// The section of the file the parser is currently in.
    #[derive(PartialEq, Eq, Clone, Copy)]
    enum Section {
        None,
        Vertices,
        Edges,
        Bags,
        BagEdges,
    }

    /// Splits a payload line into integer fields; None if any field fails to
    /// parse, in which case the caller skips the line.
    fn int_fields(line: &str) -> Option<Vec<i64>> {
        line.split_whitespace()
            .map(|f| f.parse::<i64>())
            .collect::<Result<Vec<i64>, _>>()
            .ok()
    }

    /// Reads an instance file and returns the graph plus, when the file
    /// carries bag sections, the tree decomposition.
    pub fn import_graph<P>(
        filename: P,
        options: &ImportOptions,
    ) -> Result<(Graph, Option<Decomposition>), ParseError>
    where
        P: AsRef<Path>,
    {
        let mut graph = Graph::new();
        let mut decomposition: Option<Decomposition> = None;
        let mut section = Section::None;
        let mut dimension: Option<i64> = None;
        let mut lineno = 0;

        for line in super::read_lines(filename)? {
            let line = line?;
            lineno += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            // important file parameters
            if let Some(name) = line.strip_prefix("NAME : ") {
                graph.set_name(name.trim());
                continue;
            }
            if let Some(dim) = line.strip_prefix("DIMENSION : ") {
                match dim.trim().parse::<i64>() {
                    Ok(d) => dimension = Some(d),
                    Err(_) => warn!("line {}: unreadable DIMENSION, ignored", lineno),
                }
                continue;
            }
            if line == "EDGE_WEIGHT_TYPE : EUC_2D" {
                graph.set_euclidean(true);
                continue;
            }
            // section headers
            match line {
                "NODE_COORD_SECTION" => {
                    section = Section::Vertices;
                    continue;
                }
                "EDGE_SECTION" => {
                    section = Section::Edges;
                    continue;
                }
                "BAG_COORD_SECTION" => {
                    section = Section::Bags;
                    decomposition.get_or_insert_with(Decomposition::new);
                    continue;
                }
                "BAG_EDGE_SECTION" => {
                    section = Section::BagEdges;
                    decomposition.get_or_insert_with(Decomposition::new);
                    continue;
                }
                _ => {}
            }

            match section {
                Section::None => {
                    debug!("line {}: ignoring {:?} outside any section", lineno, line);
                }
                Section::Vertices => {
                    let fields = match int_fields(line) {
                        Some(f) if f.len() == 3 => f,
                        _ => {
                            warn!("line {}: malformed vertex line skipped", lineno);
                            continue;
                        }
                    };
                    let expected = graph.vertex_count() as i64 + options.vid_start;
                    if fields[0] != expected {
                        return Err(ParseError::NonDenseVertex {
                            line: lineno,
                            expected,
                            found: fields[0],
                        });
                    }
                    graph.add_vertex(VertexData {
                        pos: Some(Pos {
                            x: fields[1] as i32,
                            y: fields[2] as i32,
                        }),
                        name: None,
                    });
                }
                Section::Edges => {
                    let fields = match int_fields(line) {
                        Some(f) if f.len() == 2 || f.len() == 3 => f,
                        _ => {
                            warn!("line {}: malformed edge line skipped", lineno);
                            continue;
                        }
                    };
                    let a = vertex_ref(fields[0], &graph, options, lineno)?;
                    let b = vertex_ref(fields[1], &graph, options, lineno)?;
                    let cost = match fields.get(2) {
                        Some(&c) if c >= 0 => Some(c as Cost),
                        Some(_) => {
                            warn!("line {}: negative edge cost skipped", lineno);
                            continue;
                        }
                        // omitted cost: legal for Euclidean instances only
                        None if graph.is_euclidean() => None,
                        None => {
                            warn!("line {}: edge without cost skipped", lineno);
                            continue;
                        }
                    };
                    if graph.has_edge(a, b) {
                        debug!("line {}: parallel edge ignored, first wins", lineno);
                    } else if !graph.add_edge(a, b, cost) {
                        warn!("line {}: unusable edge skipped", lineno);
                    }
                }
                Section::Bags => {
                    let fields = match int_fields(line) {
                        Some(f) if f.len() >= 3 => f,
                        _ => {
                            warn!("line {}: malformed bag line skipped", lineno);
                            continue;
                        }
                    };
                    let dec = decomposition.as_mut().unwrap();
                    let expected = dec.bag_count() as i64 + options.vid_start;
                    if fields[0] != expected {
                        return Err(ParseError::NonDenseBag {
                            line: lineno,
                            expected,
                            found: fields[0],
                        });
                    }
                    let mut contents = Vec::with_capacity(fields.len() - 3);
                    for &raw in &fields[3..] {
                        contents.push(vertex_ref(raw, &graph, options, lineno)?);
                    }
                    dec.add_bag(
                        contents,
                        Some(Pos {
                            x: fields[1] as i32,
                            y: fields[2] as i32,
                        }),
                    );
                }
                Section::BagEdges => {
                    let fields = match int_fields(line) {
                        Some(f) if f.len() == 2 => f,
                        _ => {
                            warn!("line {}: malformed bag edge line skipped", lineno);
                            continue;
                        }
                    };
                    let dec = decomposition.as_mut().unwrap();
                    let n = dec.bag_count() as i64;
                    let (p, q) = (fields[0] - options.vid_start, fields[1] - options.vid_start);
                    for id in [p, q] {
                        if id < 0 || id >= n {
                            return Err(ParseError::UnknownBag {
                                line: lineno,
                                id: id + options.vid_start,
                            });
                        }
                    }
                    if !dec.add_bag_edge(p as u64, q as u64) {
                        debug!("line {}: duplicate bag edge ignored", lineno);
                    }
                }
            }
        }

        if let Some(d) = dimension {
            if d != graph.vertex_count() as i64 {
                warn!(
                    "DIMENSION says {} vertices, the file defines {}",
                    d,
                    graph.vertex_count()
                );
            }
        }

        Ok((graph, decomposition))
    }

    /// Maps a raw vertex id from the file to the dense internal id, failing
    /// on references to vertices that were never declared.
    fn vertex_ref(
        raw: i64,
        graph: &Graph,
        options: &ImportOptions,
        lineno: usize,
    ) -> Result<Vertex, ParseError> {
        let id = raw - options.vid_start;
        if id < 0 || id >= graph.vertex_count() as i64 {
            return Err(ParseError::UnknownVertex {
                line: lineno,
                id: raw,
            });
        }
        Ok(Vertex::new(id as usize))
    }

    /// Writes the instance back out in the same grammar the importer reads.
    /// With embed_name set, a NAME header derived from the file name is
    /// prefixed; EDGE_WEIGHT_TYPE is always written for Euclidean graphs.
    pub fn export_graph<P>(
        filename: P,
        graph: &Graph,
        decomposition: Option<&Decomposition>,
        embed_name: bool,
    ) -> io::Result<()>
    where
        P: AsRef<Path>,
    {
        let mut s = String::new();
        if embed_name {
            let basename = filename
                .as_ref()
                .file_stem()
                .and_then(|n| n.to_str())
                .unwrap_or("graph");
            s += &format!("NAME : {}\n", basename);
        }
        if graph.is_euclidean() {
            s += "EDGE_WEIGHT_TYPE : EUC_2D\n";
        }
        s += "NODE_COORD_SECTION\n";
        for v in graph.vertices() {
            let pos = graph.position(v).unwrap_or(Pos { x: 0, y: 0 });
            s += &format!("{} {} {}\n", v.index(), pos.x, pos.y);
        }
        s += "EDGE_SECTION\n";
        for e in graph.edges() {
            s += &format!("{} {} {}\n", e.a.index(), e.b.index(), e.cost);
        }
        if let Some(dec) = decomposition {
            s += "BAG_COORD_SECTION\n";
            for (p, bag) in dec.bags() {
                let pos = bag.pos().unwrap_or(Pos { x: 0, y: 0 });
                s += &format!("{} {} {}", p, pos.x, pos.y);
                for v in bag.contents() {
                    s += &format!(" {}", v.index());
                }
                s += "\n";
            }
            s += "BAG_EDGE_SECTION\n";
            for (p, bag) in dec.bags() {
                for &q in bag.neighbours() {
                    if p < q {
                        s += &format!("{} {}\n", p, q);
                    }
                }
            }
        }
        std::fs::write(filename, s)
    }
}
