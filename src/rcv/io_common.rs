use std::path::Path;

fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Builds the rank groups of a ballot from `(candidate, rank)` pairs, as
/// found in formats that list selections per candidate.
pub fn assemble_choices(ranks: &[(String, u64)]) -> Vec<Vec<String>> {
    let max_rank = ranks.iter().map(|(_, rank)| *rank).max().unwrap_or(0);
    let mut choices: Vec<Vec<String>> = vec![Vec::new(); max_rank as usize];
    for (cname, rank) in ranks.iter() {
        if *rank == 0 {
            continue;
        }
        if let Some(elt) = choices.get_mut((rank - 1) as usize) {
            elt.push(cname.clone());
        }
    }
    choices
}

pub fn get_count(num_votes: &[u64]) -> Option<u64> {
    num_votes.first().cloned()
}

pub fn make_default_id_lineno(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}
