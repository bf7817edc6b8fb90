use std::time::Instant;
use tracing_subscriber::EnvFilter;
use tn_wep::{
    legos,
    network::*,
    pauli::Pauli,
};

fn timeit<F, T>(mut f: F) -> (T, f64)
where F: FnMut() -> T
{
    let t0 = Instant::now();
    let out: T = f();
    (out, (Instant::now() - t0).as_secs_f64())
}

// weight enumerators of the rotated surface code, computed through the
// tensor network of its Tanner graph
//
// run with e.g. `RUST_LOG=tn_wep=debug` to see individual contraction steps
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tn_wep=info"))
        )
        .with_target(false)
        .init();

    let d: usize = std::env::args().nth(1)
        .map(|arg| arg.parse())
        .transpose()?
        .unwrap_or(3);
    let h = legos::rotated_surface(d);
    let CodeNetwork { network, qubit_legs } = tanner_network(&h)?;
    println!(
        "d = {}: {} nodes, {} traces",
        d, network.nodes().len(), network.traces().len(),
    );

    print!("save network to graphviz ... ");
    let (res, t) = timeit(|| network.save_graphviz("surface-code.gv"));
    println!("{:.3e} secs", t);
    res?;

    // every planner gives the same result; only the cost differs
    for (name, config) in [
        ("declared order", ContractionConfig::declared()),
        ("greedy, intermediate size", ContractionConfig::greedy(CostKind::IntermediateSize)),
        ("greedy, stabilizer flops", ContractionConfig::greedy(CostKind::StabilizerFlops)),
        ("greedy, upper bound", ContractionConfig::greedy(CostKind::UpperBound)),
    ] {
        let mut network = network.clone();
        print!("scalar enumerator ({}) ... ", name);
        let (res, t) = timeit(|| network.scalar_enumerator(&config));
        println!("{:.3e} secs", t);
        println!("A(z) = {}", res?);
    }

    // the same code built from [[5, 1, 2]] encoding tensors
    let CodeNetwork { network: mut legos_network, .. } = rotated_surface_network(d)?;
    print!("scalar enumerator (encoding tensors) ... ");
    let (res, t) = timeit(|| legos_network.scalar_enumerator(&ContractionConfig::default()));
    println!("{:.3e} secs", t);
    println!("A(z) = {}", res?);

    // low-weight terms only
    let mut network = network.clone();
    let config = ContractionConfig::default().with_truncate_length(Some(d + 1));
    print!("truncated scalar enumerator ... ");
    let (res, t) = timeit(|| network.scalar_enumerator(&config));
    println!("{:.3e} secs", t);
    println!("A(z) = {} + ...", res?);

    // the stabilizer group itself, and from it the normalizer enumerator
    print!("conjoin nodes ... ");
    let (res, t) = timeit(|| network.conjoin_nodes());
    println!("{:.3e} secs", t);
    let code = res?;
    println!("[[{}, {}]]", code.n(), code.k());
    // brute force over the whole group
    if code.rank() <= 24 {
        println!("B(z) = {}", code.normalizer_enumerator()?);
    }

    // enumerator of the coset of a single X error in the middle of the patch
    let middle = qubit_legs[d * d / 2];
    network.set_coset(&[(middle, Pauli::X)])?;
    print!("coset enumerator ... ");
    let (res, t) = timeit(|| network.scalar_enumerator(&ContractionConfig::default()));
    println!("{:.3e} secs", t);
    println!("A_X(z) = {}", res?);

    Ok(())
}
