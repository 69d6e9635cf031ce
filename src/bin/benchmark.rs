use std::env;
use std::fs::File;
use std::io::{BufReader, Read};
use std::time::Instant;

// TODO: for another good example, see also: https://github.com/shepmaster/sxd-document

fn measure_average_advertised_bandwidth(filename: String) {
    let file = match File::open(&filename) {
        Err(e) => panic!("{}", e),
        Ok(file) => file,
    };

    let mut data = String::new();
    let mut br = BufReader::new(file);
    br.read_to_string(&mut data).unwrap();

    let start = Instant::now();
    let directory = match tordir::parse_router_list(&data) {
        Ok(directory) => directory,
        Err(e) => panic!("{}", e),
    };
    let (mut total_bw, mut count) = (0u64, 0u64);
    for router in &directory.routers {
        total_bw += router.bandwidth;
        count += 1;
    }
    let duration = start.elapsed();
    let nanos = duration.as_secs() * 1_000_000_000 + duration.subsec_nanos() as u64;

    println!("Finished measure_average_advertised_bandwidth('{}')", filename);
    println!("  Total time: {:.2}ms", nanos as f64 / 1_000_000f64);
    println!("  Processed router descriptors: {}", count);
    if count > 0 {
        println!("  Average advertised bandwidth: {}", total_bw / count);
        println!("  Time per router descriptor: {}ns", nanos / count);
    }
}

fn main() {
    let mut args: Vec<_> = env::args().collect();
    let filename = args.remove(1);

    measure_average_advertised_bandwidth(filename);
}
