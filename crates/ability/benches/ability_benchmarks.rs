use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{Duration, TimeZone, Utc};
use courseware_ability::{
    AbilityConfig, AbilityInput, Action, ContentResource, Entitlement, EntitlementType,
    OrganizationRoleName, Purchase, PurchaseStatus, ResourceKind, SubjectType, Tier, Viewer,
    compile, subject,
};
use courseware_core::ContentId;

/// Module with `sections` sections of `lessons` lessons each; the first section is free.
fn build_module(sections: usize, lessons: usize) -> (ContentResource, Vec<ContentId>) {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let mut module = ContentResource::new("cohort_bench", ResourceKind::Cohort)
        .starting_at(now - Duration::days(1))
        .sold_as("prod_bench");
    let mut ids = Vec::new();

    for s in 0..sections {
        let mut section = ContentResource::new(format!("section_{s}"), ResourceKind::Section);
        for l in 0..lessons {
            let id = format!("lesson_{s}_{l}");
            ids.push(ContentId::new(id.clone()));
            section = section.with_child(ContentResource::new(id, ResourceKind::Lesson), None);
        }
        let tier = (s == 0).then_some(Tier::Free);
        module = module.with_child(section, tier);
    }

    (module, ids)
}

fn bench_compile(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let types = vec![
        EntitlementType::new("et_cohort", "cohort_content_access"),
        EntitlementType::new("et_workshop", "workshop_content_access"),
    ];
    let viewer = Viewer::new("u1")
        .with_organization_role("org_1", OrganizationRoleName::Member)
        .with_entitlement(Entitlement::new("et_cohort", ["cohort_bench"]));
    let purchases = vec![
        Purchase::new("p1", "prod_bench", PurchaseStatus::Valid).with_charge("ch_1"),
        Purchase::new("p2", "prod_other", PurchaseStatus::Restricted).in_country("DE"),
    ];
    let config = AbilityConfig::default();

    let mut group = c.benchmark_group("compile");
    for lessons in [10usize, 100, 1_000] {
        let (module, ids) = build_module(10, lessons / 10);
        group.throughput(Throughput::Elements(lessons as u64));
        group.bench_with_input(BenchmarkId::from_parameter(lessons), &lessons, |b, _| {
            b.iter(|| {
                let input = AbilityInput::new(now)
                    .viewer(&viewer)
                    .purchases(&purchases)
                    .entitlement_types(&types)
                    .module(&module)
                    .country("US")
                    .all_module_resource_ids(&ids);
                black_box(compile(black_box(&input), &config))
            })
        });
    }
    group.finish();
}

fn bench_can(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let types = vec![EntitlementType::new("et_cohort", "cohort_content_access")];
    let viewer = Viewer::new("u1").with_entitlement(Entitlement::new("et_cohort", ["cohort_bench"]));
    let (module, ids) = build_module(10, 100);
    let input = AbilityInput::new(now)
        .viewer(&viewer)
        .entitlement_types(&types)
        .module(&module)
        .all_module_resource_ids(&ids);
    let ability = compile(&input, &AbilityConfig::default());

    let last_lesson = subject(SubjectType::Content, "lesson_9_99");
    let unknown = subject(SubjectType::Content, "lesson_missing");

    c.bench_function("can/granted_last_lesson", |b| {
        b.iter(|| black_box(ability.can(Action::Read, black_box(&last_lesson))))
    });
    c.bench_function("can/denied_unknown_lesson", |b| {
        b.iter(|| black_box(ability.can(Action::Read, black_box(&unknown))))
    });
    c.bench_function("can/sentinel", |b| {
        b.iter(|| black_box(ability.can(Action::Read, SubjectType::PendingOpenAccess)))
    });
}

criterion_group!(benches, bench_compile, bench_can);
criterion_main!(benches);
