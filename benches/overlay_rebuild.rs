#![forbid(unsafe_code)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use linkgraph_overlay::codec::{load_state, save_state, SaveVersion};
use linkgraph_overlay::overlay::{
    DrawTarget, Network, OverlayCache, OverlayOptions, RebuildKind, SmallMapSurface, Station,
    Viewport, ViewportSurface,
};
use linkgraph_overlay::storage::LinkGraph;
use linkgraph_overlay::types::{
    CargoId, CargoMask, CompanyId, CompanyMask, Date, NodeId, Owner, Point, Rect, StationId,
    TileIndex,
};

const MAP_TILES: u16 = 512;
const CARGOS: u8 = 4;

fn random_network(stations: usize, edges_per_graph: usize, seed: u64) -> Network {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut net = Network::new(Date(29));
    for i in 0..stations {
        let owner = if rng.gen_bool(0.1) {
            Owner::Neutral
        } else {
            Owner::Company(CompanyId(rng.gen_range(0..8)))
        };
        let tile = TileIndex::from_xy(rng.gen_range(0..MAP_TILES), rng.gen_range(0..MAP_TILES));
        net.insert_station(Station::new(StationId(i as u16 + 1), owner, tile));
    }
    for cargo in 0..CARGOS {
        let id = net
            .state
            .insert_graph(LinkGraph::new(CargoId(cargo)))
            .expect("graph");
        for i in 0..stations {
            net.join_graph(StationId(i as u16 + 1), CargoId(cargo), id)
                .expect("join");
        }
        let graph = net.state.graph_mut(id).expect("graph");
        for _ in 0..edges_per_graph {
            let from = rng.gen_range(0..stations) as u16;
            let to = rng.gen_range(0..stations) as u16;
            if from == to {
                continue;
            }
            let capacity = rng.gen_range(1..400);
            let usage = rng.gen_range(0..capacity);
            graph
                .add_edge(NodeId(from), NodeId(to), capacity, usage, 12, Date(0))
                .expect("edge");
        }
    }
    net
}

fn viewport() -> ViewportSurface {
    ViewportSurface::new(Viewport {
        virtual_left: 1024,
        virtual_top: 512,
        virtual_width: 1920,
        virtual_height: 1080,
        zoom: 1,
    })
}

struct NullTarget {
    ops: usize,
}

impl DrawTarget for NullTarget {
    fn draw_line(&mut self, _from: Point, _to: Point, _colour: u8, _width: i32, _dash: i32) {
        self.ops += 1;
    }

    fn fill_rect(&mut self, _rect: Rect, _colour: u8) {
        self.ops += 1;
    }
}

fn new_cache() -> OverlayCache {
    OverlayCache::new(OverlayOptions::default(), CargoMask::all(), CompanyMask::all())
}

fn overlay_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay/rebuild");
    group.sample_size(30);

    for stations in [256usize, 2_048] {
        let net = random_network(stations, stations * 3, 0x5eed);
        group.throughput(Throughput::Elements(stations as u64));

        let view = viewport();
        group.bench_with_input(BenchmarkId::new("full_viewport", stations), &net, |b, net| {
            let mut cache = new_cache();
            b.iter(|| {
                cache.rebuild(RebuildKind::Full, net, &view);
                black_box(cache.links().len())
            });
        });

        let map = SmallMapSurface::new(MAP_TILES as i32, MAP_TILES as i32, 1);
        group.bench_with_input(BenchmarkId::new("full_small_map", stations), &net, |b, net| {
            let mut cache = new_cache();
            b.iter(|| {
                cache.rebuild(RebuildKind::Full, net, &map);
                black_box(cache.links().len())
            });
        });

        group.bench_with_input(
            BenchmarkId::new("incremental_unchanged", stations),
            &net,
            |b, net| {
                let mut cache = new_cache();
                cache.rebuild(RebuildKind::Full, net, &map);
                b.iter(|| {
                    cache.rebuild(RebuildKind::Incremental, net, &map);
                    black_box(cache.links().len())
                });
            },
        );

        group.bench_with_input(BenchmarkId::new("draw", stations), &net, |b, net| {
            let mut cache = new_cache();
            cache.rebuild(RebuildKind::Full, net, &map);
            let dpi = Rect::from_size(0, 0, MAP_TILES as i32, MAP_TILES as i32);
            b.iter(|| {
                let mut target = NullTarget { ops: 0 };
                cache.draw(net, &mut target, &dpi);
                black_box(target.ops)
            });
        });
    }
    group.finish();
}

fn codec_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec/state");
    group.sample_size(20);
    let net = random_network(512, 1_536, 7);

    for version in [SaveVersion(186), SaveVersion::CURRENT] {
        let bytes = save_state(&net.state, version).expect("save");
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("save", version.0), &version, |b, version| {
            b.iter(|| black_box(save_state(&net.state, *version).expect("save").len()));
        });
        group.bench_with_input(BenchmarkId::new("load", version.0), &bytes, |b, bytes| {
            b.iter(|| black_box(load_state(bytes).expect("load").state.graphs.len()));
        });
    }
    group.finish();
}

criterion_group!(benches, overlay_rebuild, codec_roundtrip);
criterion_main!(benches);
