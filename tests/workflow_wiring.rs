//! Workflow-level scenarios: parameter wiring across merging chains, and
//! lifecycle behaviour.

use plegma::exec::State;
use plegma::workflow::{GeneralTask, Parameter, Workflow};

/// Two chains merging into a sink, with outputs wired into inputs:
/// v3 = 2*(v1+100) + (3*v2-10) with v1=100, v2=200 must come out as 990.
#[tokio::test]
async fn outputs_flow_into_inputs_across_the_dag() {
    let wf = Workflow::new("calc");

    wf.add_task(GeneralTask::new("seed1", |_| {
        Ok(vec![Parameter::literal("v1", 100)])
    }))
    .unwrap();
    wf.add_task(GeneralTask::new("left", |inputs| {
        let v1 = inputs["v1"].value.as_i64().unwrap_or(0);
        Ok(vec![Parameter::literal("a", 2 * (v1 + 100))])
    }))
    .unwrap();
    wf.add_task(GeneralTask::new("seed2", |_| {
        Ok(vec![Parameter::literal("v2", 200)])
    }))
    .unwrap();
    wf.add_task(GeneralTask::new("right", |inputs| {
        let v2 = inputs["v2"].value.as_i64().unwrap_or(0);
        Ok(vec![Parameter::literal("b", 3 * v2 - 10)])
    }))
    .unwrap();
    wf.add_task(GeneralTask::new("sum", |inputs| {
        let a = inputs["a"].value.as_i64().unwrap_or(0);
        let b = inputs["b"].value.as_i64().unwrap_or(0);
        Ok(vec![Parameter::literal("v3", a + b)])
    }))
    .unwrap();

    for (pre, succ) in [
        ("seed1", "left"),
        ("left", "sum"),
        ("seed2", "right"),
        ("right", "sum"),
    ] {
        wf.add_dependency(pre, succ).unwrap();
    }

    wf.set_output("seed1", vec![Parameter::literal("v1", 0)])
        .unwrap();
    wf.set_output("seed2", vec![Parameter::literal("v2", 0)])
        .unwrap();
    wf.set_output("left", vec![Parameter::literal("a", 0)])
        .unwrap();
    wf.set_output("right", vec![Parameter::literal("b", 0)])
        .unwrap();
    wf.set_output("sum", vec![Parameter::literal("v3", 0)])
        .unwrap();

    wf.set_input(
        "left",
        vec![Parameter::by_ref("v1", "calc.seed1.output.v1")],
    )
    .unwrap();
    wf.set_input(
        "right",
        vec![Parameter::by_ref("v2", "calc.seed2.output.v2")],
    )
    .unwrap();
    wf.set_input(
        "sum",
        vec![
            Parameter::by_ref("a", "calc.left.output.a"),
            Parameter::by_ref("b", "calc.right.output.b"),
        ],
    )
    .unwrap();

    wf.start().unwrap();
    wf.wait().await.unwrap();
    assert_eq!(wf.status(), State::Success);

    let outs = wf.get_output("sum").unwrap();
    let v3 = outs.iter().find(|p| p.name == "v3").unwrap();
    assert_eq!(v3.value.as_i64(), Some(990));
}

#[tokio::test]
async fn failing_task_fails_the_workflow() {
    let wf = Workflow::new("wf");
    wf.add_task(GeneralTask::new("ok", |_| Ok(vec![]))).unwrap();
    wf.add_task(GeneralTask::new("bad", |_| Err("kaput".into())))
        .unwrap();
    wf.add_task(GeneralTask::new("after", |_| Ok(vec![])))
        .unwrap();
    wf.add_dependency("bad", "after").unwrap();

    wf.start().unwrap();
    assert!(wf.wait().await.is_err());
    assert_eq!(wf.status(), State::Failed);

    let info = wf.info();
    assert_eq!(info.status, "failed");
    let bad = info.tasks.iter().find(|t| t.name == "bad").unwrap();
    assert_eq!(bad.status, "failed");
    assert!(bad.err.contains("kaput"));
    let after = info.tasks.iter().find(|t| t.name == "after").unwrap();
    assert_eq!(after.status, "waiting");
}

#[tokio::test]
async fn stop_is_idempotent_and_restart_reruns() {
    let wf = Workflow::new("wf");
    wf.add_task(GeneralTask::new("spin", |_| {
        std::thread::sleep(std::time::Duration::from_millis(200));
        Ok(vec![])
    }))
    .unwrap();

    wf.start().unwrap();
    wf.stop().unwrap();
    wf.stop().unwrap();
    assert_eq!(wf.status(), State::Stopped);

    // a stopped workflow can start over from scratch
    wf.start().unwrap();
    wf.wait().await.unwrap();
    assert_eq!(wf.status(), State::Success);
}

#[tokio::test]
async fn removing_a_task_also_drops_its_links() {
    let wf = Workflow::new("wf");
    wf.add_task(GeneralTask::new("a", |_| Ok(vec![]))).unwrap();
    wf.add_task(GeneralTask::new("b", |_| Ok(vec![]))).unwrap();
    wf.add_dependency("a", "b").unwrap();
    wf.remove_task("b").unwrap();

    let info = wf.info();
    assert_eq!(info.tasks.len(), 1);
    assert!(info.tasks[0].successor.is_empty());

    wf.start().unwrap();
    wf.wait().await.unwrap();
    assert_eq!(wf.status(), State::Success);
}
